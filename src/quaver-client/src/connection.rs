//! The connection state machine: one outstanding response at a time, with
//! command lists as the only way to queue several commands.

use crate::command::Command;
use crate::element::{self, Element, Line};
use crate::error::{ErrorKind, ErrorState, MpdError, MpdResult, SequenceError};
use crate::framer::{LineBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::transport::{self, Stream};
use quaver_core::redact::redact_secrets;
use std::io::{self, ErrorKind as IoErrorKind, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

/// First token of the server greeting.
pub const GREETING: &str = "OK MPD ";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bound on every connect, read and write.
    pub timeout: Duration,
    /// Longest response line accepted.
    pub buffer_capacity: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    None,
    /// `command_list_begin`: one combined response.
    Plain,
    /// `command_list_ok_begin`: a `list_OK` after each command's output.
    Acknowledged,
}

/// One raw reply line, as seen by [`Connection::next_element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Pair(Element),
    ListOk,
    Ok,
}

pub struct Connection<S: Stream = TcpStream> {
    stream: S,
    buffer: LineBuffer,
    timeout: Duration,
    version: (u32, u32, u32),
    last_error: Option<ErrorState>,
    broken: Option<ErrorKind>,
    /// The current response has been read up to its `OK` or `ACK`.
    done: bool,
    list_mode: ListMode,
    list_oks: u32,
    /// A `list_OK` ended the current command's output.
    done_list_ok: bool,
    /// Element pulled by a builder but belonging to the next record.
    pending: Option<Element>,
    pub(crate) search: Option<String>,
}

impl Connection<TcpStream> {
    /// Resolve `host`, connect to the first reachable address and check the
    /// server greeting.
    pub fn connect(host: &str, port: u16, options: ConnectOptions) -> MpdResult<Self> {
        let addrs = transport::resolve(host, port)?;
        let stream = transport::open_socket(&addrs, options.timeout)?;
        Self::from_stream(stream, options)
    }
}

impl<S: Stream> Connection<S> {
    /// Wrap an already connected stream and perform the greeting handshake.
    pub fn from_stream(stream: S, options: ConnectOptions) -> MpdResult<Self> {
        let mut conn = Self {
            stream,
            buffer: LineBuffer::with_capacity(options.buffer_capacity),
            timeout: options.timeout,
            version: (0, 0, 0),
            last_error: None,
            broken: None,
            done: true,
            list_mode: ListMode::None,
            list_oks: 0,
            done_list_ok: false,
            pending: None,
            search: None,
        };

        let greeting = match conn.buffer.next_line(&mut conn.stream, conn.timeout) {
            Ok(line) => line,
            Err(MpdError::Timeout | MpdError::ConnectionClosed) => {
                return Err(MpdError::NoResponse)
            }
            Err(err) => return Err(err),
        };
        conn.version = parse_greeting(&greeting)?;
        tracing::info!(
            version = %format!("{}.{}.{}", conn.version.0, conn.version.1, conn.version.2),
            "connected to server"
        );
        Ok(conn)
    }

    /// Protocol version from the greeting as `(major, minor, patch)`.
    pub fn server_version(&self) -> (u32, u32, u32) {
        self.version
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn last_error(&self) -> Option<&ErrorState> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// False once a timeout, closed socket, overrun or write failure hit the
    /// stream; the connection must then be dropped.
    pub fn is_usable(&self) -> bool {
        self.broken.is_none()
    }

    /// True when no response is outstanding.
    pub fn is_idle(&self) -> bool {
        self.done && self.list_mode == ListMode::None
    }

    pub fn list_mode(&self) -> ListMode {
        self.list_mode
    }

    /// `list_OK` markers still expected in the current response.
    pub fn pending_list_oks(&self) -> u32 {
        self.list_oks
    }

    /// Shut the socket down. Buffered data and any open search are discarded
    /// with the connection.
    pub fn close(mut self) -> MpdResult<()> {
        tracing::debug!("closing connection");
        self.stream.shutdown().map_err(MpdError::System)
    }

    /// Send one command. Outside a command list the previous response must
    /// have been read to its end.
    pub fn send(&mut self, command: &Command) -> MpdResult<()> {
        self.execute(&command.to_line())
    }

    /// Send a preformatted line; a trailing newline is added when missing.
    pub fn send_raw(&mut self, line: &str) -> MpdResult<()> {
        if line.ends_with('\n') {
            self.execute(line)
        } else {
            self.execute(&format!("{line}\n"))
        }
    }

    pub(crate) fn execute(&mut self, line: &str) -> MpdResult<()> {
        self.ensure_usable()?;
        if !self.done && self.list_mode == ListMode::None {
            return Err(self.fail(SequenceError::NotDoneProcessing.into()));
        }
        self.last_error = None;
        self.write_line(line)?;

        match self.list_mode {
            ListMode::None => {
                self.done = false;
                self.done_list_ok = false;
                self.pending = None;
            }
            ListMode::Plain => {}
            ListMode::Acknowledged => self.list_oks += 1,
        }
        Ok(())
    }

    /// Open a command list; replies come back as one response after
    /// [`list_end`](Self::list_end).
    pub fn list_begin(&mut self) -> MpdResult<()> {
        self.open_list(ListMode::Plain, "command_list_begin\n")
    }

    /// Open a command list whose output carries a `list_OK` after each command.
    pub fn list_ok_begin(&mut self) -> MpdResult<()> {
        self.open_list(ListMode::Acknowledged, "command_list_ok_begin\n")
    }

    fn open_list(&mut self, mode: ListMode, line: &str) -> MpdResult<()> {
        self.ensure_usable()?;
        if self.list_mode != ListMode::None {
            return Err(self.fail(SequenceError::AlreadyInListMode.into()));
        }
        if !self.done {
            return Err(self.fail(SequenceError::NotDoneProcessing.into()));
        }
        self.last_error = None;
        self.write_line(line)?;
        self.list_mode = mode;
        self.list_oks = 0;
        Ok(())
    }

    /// Close the open command list; the server now executes it and the
    /// combined output can be read.
    pub fn list_end(&mut self) -> MpdResult<()> {
        self.ensure_usable()?;
        if self.list_mode == ListMode::None {
            return Err(self.fail(SequenceError::NotInListMode.into()));
        }
        self.write_line("command_list_end\n")?;
        self.list_mode = ListMode::None;
        self.done = false;
        self.done_list_ok = false;
        self.pending = None;
        Ok(())
    }

    /// Next raw line of the current response. `ACK` lines surface as
    /// [`MpdError::Ack`]; after `OK` or `ACK` further calls fail.
    pub fn next_element(&mut self) -> MpdResult<Reply> {
        self.ensure_usable()?;
        if let Some(element) = self.pending.take() {
            return Ok(Reply::Pair(element));
        }
        if self.done {
            return Err(self.fail(SequenceError::AlreadyDone.into()));
        }
        self.done_list_ok = false;
        self.read_reply()
    }

    /// Read and discard the rest of the current response. Undecodable lines
    /// are skipped; the first such failure is still reported.
    pub fn finish_command(&mut self) -> MpdResult<()> {
        self.ensure_usable()?;
        self.pending = None;
        let mut first_failure = None;
        while !self.done {
            self.done_list_ok = false;
            match self.read_reply() {
                Ok(_) => {}
                Err(err @ (MpdError::Decode(_) | MpdError::Sequence(_))) if !self.done => {
                    first_failure.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Skip to the output of the next command in an acknowledged list.
    /// Returns false when no further command output follows.
    pub fn next_list_ok_command(&mut self) -> MpdResult<bool> {
        self.ensure_usable()?;
        self.pending = None;
        while !self.done && self.list_oks > 0 && !self.done_list_ok {
            self.read_reply()?;
        }
        if self.list_oks == 0 && !self.done {
            // Only the closing OK can follow the last list_OK.
            self.finish_command()?;
        }
        self.done_list_ok = false;
        Ok(self.list_oks > 0 && !self.done)
    }

    /// Send `command` and collect every pair of its response.
    pub fn run(&mut self, command: &Command) -> MpdResult<Vec<Element>> {
        self.send(command)?;
        let mut elements = Vec::new();
        loop {
            match self.next_element()? {
                Reply::Pair(element) => elements.push(element),
                Reply::ListOk => {}
                Reply::Ok => return Ok(elements),
            }
        }
    }

    // Record-level access for the typed builders.

    /// Whether the current command has no more records to offer.
    pub(crate) fn command_done(&self) -> bool {
        self.done || (self.list_oks > 0 && self.done_list_ok)
    }

    /// Start of a builder call: fails on a broken connection, returns false at
    /// end of stream.
    pub(crate) fn has_records(&mut self) -> MpdResult<bool> {
        self.ensure_usable()?;
        Ok(self.pending.is_some() || !self.command_done())
    }

    /// The element at the cursor, pulling one from the wire if needed. `None`
    /// at the end of the current command's output.
    pub(crate) fn current(&mut self) -> MpdResult<Option<&Element>> {
        if self.pending.is_none() {
            if self.command_done() {
                return Ok(None);
            }
            match self.read_reply()? {
                Reply::Pair(element) => self.pending = Some(element),
                Reply::ListOk | Reply::Ok => return Ok(None),
            }
        }
        Ok(self.pending.as_ref())
    }

    /// Drop the element at the cursor.
    pub(crate) fn advance(&mut self) {
        self.pending = None;
    }

    fn read_reply(&mut self) -> MpdResult<Reply> {
        let line = match self.buffer.next_line(&mut self.stream, self.timeout) {
            Ok(line) => line,
            Err(err) => return Err(self.fail(err)),
        };
        tracing::trace!(line = %line, "received");

        match element::classify(&line) {
            Ok(Line::Pair(element)) => Ok(Reply::Pair(element)),
            Ok(Line::Ok) => {
                let missing = self.list_oks;
                self.done = true;
                self.done_list_ok = false;
                self.list_oks = 0;
                if missing > 0 {
                    return Err(self.fail(SequenceError::ExpectedMoreListOks.into()));
                }
                Ok(Reply::Ok)
            }
            Ok(Line::ListOk) => {
                if self.list_oks == 0 {
                    return Err(self.fail(SequenceError::UnexpectedListOk.into()));
                }
                self.list_oks -= 1;
                self.done_list_ok = true;
                Ok(Reply::ListOk)
            }
            Ok(Line::Ack(ack)) => {
                self.done = true;
                self.done_list_ok = false;
                self.list_oks = 0;
                self.pending = None;
                tracing::debug!(code = ack.code.code(), message = %ack.message, "server ACK");
                Err(self.fail(MpdError::Ack(ack)))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn write_line(&mut self, line: &str) -> MpdResult<()> {
        tracing::debug!(command = %redact_secrets(line.trim_end()), "sending");
        let deadline = Instant::now() + self.timeout;
        let mut bytes = line.as_bytes();

        while !bytes.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.fail(MpdError::Timeout));
            }
            if let Err(err) = self.stream.set_write_timeout(remaining) {
                return Err(self.fail(MpdError::System(err)));
            }
            match self.stream.write(bytes) {
                Ok(0) => {
                    let err = io::Error::new(IoErrorKind::WriteZero, "server stopped accepting data");
                    return Err(self.fail(MpdError::Send(err)));
                }
                Ok(n) => bytes = &bytes[n..],
                Err(err)
                    if matches!(
                        err.kind(),
                        IoErrorKind::Interrupted | IoErrorKind::WouldBlock | IoErrorKind::TimedOut
                    ) => {}
                Err(err) => return Err(self.fail(MpdError::Send(err))),
            }
        }

        if let Err(err) = self.stream.flush() {
            return Err(self.fail(MpdError::Send(err)));
        }
        Ok(())
    }

    pub(crate) fn ensure_usable(&self) -> MpdResult<()> {
        match self.broken {
            Some(kind) => Err(MpdError::Unusable(kind)),
            None => Ok(()),
        }
    }

    /// Record `err` as the connection's last error. Fatal errors end the
    /// response and retire the connection.
    pub(crate) fn fail(&mut self, err: MpdError) -> MpdError {
        self.last_error = Some(ErrorState::from(&err));
        if err.is_fatal() {
            tracing::warn!(error = %err, "connection failed");
            self.broken = Some(err.kind());
            self.done = true;
            self.done_list_ok = false;
            self.list_oks = 0;
            self.list_mode = ListMode::None;
            self.pending = None;
            self.search = None;
            self.buffer.clear();
        }
        err
    }
}

/// Check `OK MPD <major>.<minor>.<patch>` and return the version.
pub fn parse_greeting(line: &str) -> MpdResult<(u32, u32, u32)> {
    let not_server = || MpdError::NotServer {
        greeting: line.to_string(),
    };
    let version = line.strip_prefix(GREETING).ok_or_else(not_server)?;
    let parts: Vec<&str> = version.trim_end().split('.').collect();
    if parts.len() != 3 {
        return Err(not_server());
    }
    let mut numbers = [0u32; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| not_server())?;
    }
    Ok((numbers[0], numbers[1], numbers[2]))
}
