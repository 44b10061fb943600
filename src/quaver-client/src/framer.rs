//! Bounded receive buffer that turns a byte stream into `\n`-terminated lines.

use crate::error::{MpdError, MpdResult};
use crate::transport::Stream;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

/// Largest line the server is expected to send, matching the server's own limit.
pub const DEFAULT_BUFFER_CAPACITY: usize = 50_000;

#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    len: usize,
    start: usize,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            len: 0,
            start: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes received but not yet returned as part of a line.
    pub fn pending(&self) -> usize {
        self.len - self.start
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.len = 0;
        self.start = 0;
    }

    /// Return the next complete line, reading from `io` until one arrives or
    /// `timeout` elapses.
    pub fn next_line<S: Stream>(&mut self, io: &mut S, timeout: Duration) -> MpdResult<String> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }

            if self.len == self.buf.len() {
                self.compact();
                if self.len == self.buf.len() {
                    return Err(MpdError::BufferOverrun {
                        capacity: self.buf.len(),
                    });
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MpdError::Timeout);
            }
            io.set_read_timeout(remaining).map_err(MpdError::System)?;

            match io.read(&mut self.buf[self.len..]) {
                Ok(0) => return Err(MpdError::ConnectionClosed),
                Ok(n) => self.len += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if Instant::now() >= deadline {
                        return Err(MpdError::Timeout);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "read failed");
                    return Err(MpdError::ConnectionClosed);
                }
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let unread = &self.buf[self.start..self.len];
        let offset = unread.iter().position(|&b| b == b'\n')?;
        let line = String::from_utf8_lossy(&unread[..offset]).into_owned();
        self.start += offset + 1;
        if self.start == self.len {
            self.clear();
        }
        Some(line)
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.copy_within(self.start..self.len, 0);
        self.len -= self.start;
        self.start = 0;
    }
}
