//! Socket setup: name resolution, timed connect, and the [`Stream`] seam the
//! rest of the client reads and writes through.

use crate::error::{MpdError, MpdResult};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A byte stream whose blocking operations can be bounded by a timeout.
///
/// `TcpStream` is the production implementation; tests substitute scripted
/// in-memory streams.
pub trait Stream: Read + Write {
    /// Bound the next blocking read by `timeout`.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Bound the next blocking write by `timeout`.
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Release the underlying resource. Further I/O is not expected.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Stream for TcpStream {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        TcpStream::set_read_timeout(self, Some(clamp(timeout)))
    }

    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        TcpStream::set_write_timeout(self, Some(clamp(timeout)))
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}

// A zero duration is rejected by the socket APIs.
fn clamp(timeout: Duration) -> Duration {
    timeout.max(Duration::from_millis(1))
}

/// Resolve `host:port` into connect candidates, in resolver order.
pub fn resolve(host: &str, port: u16) -> MpdResult<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| MpdError::UnknownHost {
            host: host.to_string(),
            source: Some(source),
        })?
        .collect();
    if addrs.is_empty() {
        return Err(MpdError::UnknownHost {
            host: host.to_string(),
            source: None,
        });
    }
    Ok(addrs)
}

/// Try each candidate in turn, giving every one the full `timeout`.
pub fn open_socket(addrs: &[SocketAddr], timeout: Duration) -> MpdResult<TcpStream> {
    first_usable(addrs, |addr| {
        let stream = TcpStream::connect_timeout(addr, clamp(timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    })
}

/// Return the first candidate `attempt` turns into a socket. A failure at
/// any step of the attempt moves on to the next address.
fn first_usable<T, F>(addrs: &[SocketAddr], mut attempt: F) -> MpdResult<T>
where
    F: FnMut(&SocketAddr) -> io::Result<T>,
{
    let mut last_failure = None;
    for addr in addrs {
        tracing::debug!(%addr, "connecting");
        match attempt(addr) {
            Ok(stream) => return Ok(stream),
            Err(source) => {
                tracing::debug!(%addr, error = %source, "connect candidate failed");
                last_failure = Some((*addr, source));
            }
        }
    }

    match last_failure {
        Some((addr, source)) => Err(MpdError::ConnectionPort {
            addr: addr.to_string(),
            source,
        }),
        None => Err(MpdError::System(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no addresses to connect to",
        ))),
    }
}
