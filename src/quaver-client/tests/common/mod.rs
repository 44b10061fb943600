#![allow(dead_code)]

use quaver_client::{ConnectOptions, Connection, Stream};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

pub const GREETING: &str = "OK MPD 0.23.5\n";

/// In-memory server: plays back a fixed byte script and records every byte
/// the client writes.
pub struct Scripted {
    incoming: Vec<u8>,
    pos: usize,
    chunk: usize,
    stall_at_end: bool,
    write_chunk: usize,
    stall_writes: bool,
    read_faults: VecDeque<io::ErrorKind>,
    write_faults: VecDeque<io::ErrorKind>,
    written: Rc<RefCell<Vec<u8>>>,
}

impl Scripted {
    pub fn new(script: &str) -> Self {
        Self {
            incoming: script.as_bytes().to_vec(),
            pos: 0,
            chunk: usize::MAX,
            stall_at_end: false,
            write_chunk: usize::MAX,
            stall_writes: false,
            read_faults: VecDeque::new(),
            write_faults: VecDeque::new(),
            written: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Deliver at most `chunk` bytes per read.
    pub fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Once the script runs out, report "no data yet" instead of end of stream.
    pub fn stalling(mut self) -> Self {
        self.stall_at_end = true;
        self
    }

    /// Accept at most `chunk` bytes per write.
    pub fn write_chunked(mut self, chunk: usize) -> Self {
        self.write_chunk = chunk.max(1);
        self
    }

    /// Refuse every write with "would block".
    pub fn stalling_writes(mut self) -> Self {
        self.stall_writes = true;
        self
    }

    /// Fail the next read with `kind` before playing the script.
    pub fn read_fault(mut self, kind: io::ErrorKind) -> Self {
        self.read_faults.push_back(kind);
        self
    }

    /// Fail the next write with `kind` before accepting bytes.
    pub fn write_fault(mut self, kind: io::ErrorKind) -> Self {
        self.write_faults.push_back(kind);
        self
    }

    pub fn log(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.written)
    }
}

impl Read for Scripted {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if let Some(kind) = self.read_faults.pop_front() {
            return Err(io::Error::new(kind, "scripted read fault"));
        }
        let left = self.incoming.len() - self.pos;
        if left == 0 && self.stall_at_end {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "stalled"));
        }
        let n = left.min(out.len()).min(self.chunk);
        out[..n].copy_from_slice(&self.incoming[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for Scripted {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_faults.pop_front() {
            return Err(io::Error::new(kind, "scripted write fault"));
        }
        if self.stall_writes {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "stalled"));
        }
        let n = buf.len().min(self.write_chunk);
        self.written.borrow_mut().extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Stream for Scripted {
    fn set_read_timeout(&mut self, _: Duration) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&mut self, _: Duration) -> io::Result<()> {
        Ok(())
    }
}

pub fn options() -> ConnectOptions {
    ConnectOptions {
        timeout: Duration::from_millis(200),
        ..ConnectOptions::default()
    }
}

/// Connect to a scripted server whose replies follow the greeting.
pub fn connect(replies: &str) -> (Connection<Scripted>, Rc<RefCell<Vec<u8>>>) {
    connect_with(Scripted::new(&format!("{GREETING}{replies}")), options())
}

pub fn connect_with(
    stream: Scripted,
    options: ConnectOptions,
) -> (Connection<Scripted>, Rc<RefCell<Vec<u8>>>) {
    let log = stream.log();
    let conn = Connection::from_stream(stream, options).expect("handshake");
    (conn, log)
}

/// Everything the client has sent so far.
pub fn sent(log: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&log.borrow()).into_owned()
}
