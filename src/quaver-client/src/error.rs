use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes the server reports inside `ACK [code@pos]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckCode {
    NotList,
    Arg,
    Password,
    Permission,
    UnknownCommand,
    NoExist,
    PlaylistMax,
    System,
    PlaylistLoad,
    UpdateAlready,
    PlayerSync,
    Exist,
    /// A code this client does not name, or `-1` when the bracket was missing.
    Other(i32),
}

impl AckCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => AckCode::NotList,
            2 => AckCode::Arg,
            3 => AckCode::Password,
            4 => AckCode::Permission,
            5 => AckCode::UnknownCommand,
            50 => AckCode::NoExist,
            51 => AckCode::PlaylistMax,
            52 => AckCode::System,
            53 => AckCode::PlaylistLoad,
            54 => AckCode::UpdateAlready,
            55 => AckCode::PlayerSync,
            56 => AckCode::Exist,
            other => AckCode::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AckCode::NotList => 1,
            AckCode::Arg => 2,
            AckCode::Password => 3,
            AckCode::Permission => 4,
            AckCode::UnknownCommand => 5,
            AckCode::NoExist => 50,
            AckCode::PlaylistMax => 51,
            AckCode::System => 52,
            AckCode::PlaylistLoad => 53,
            AckCode::UpdateAlready => 54,
            AckCode::PlayerSync => 55,
            AckCode::Exist => 56,
            AckCode::Other(code) => *code,
        }
    }
}

/// A command failure reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckError {
    pub code: AckCode,
    /// Index of the failing command within a command list, `-1` when unknown.
    pub position: i32,
    /// Command name from the `{...}` part, if the server sent one.
    pub command: Option<String>,
    pub message: String,
}

impl AckError {
    pub const UNKNOWN_CODE: i32 = -1;
    pub const UNKNOWN_POSITION: i32 = -1;
}

impl fmt::Display for AckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command {
            Some(cmd) => write!(
                f,
                "[{}@{}] {{{}}} {}",
                self.code.code(),
                self.position,
                cmd,
                self.message
            ),
            None => write!(f, "[{}@{}] {}", self.code.code(), self.position, self.message),
        }
    }
}

/// Misuse of the request/response cycle by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("not done processing current command")]
    NotDoneProcessing,
    #[error("already done processing current command")]
    AlreadyDone,
    #[error("already in command list mode")]
    AlreadyInListMode,
    #[error("not in command list mode")]
    NotInListMode,
    #[error("got an unexpected list_OK")]
    UnexpectedListOk,
    #[error("expected more list_OK's")]
    ExpectedMoreListOks,
    #[error("search already in progress")]
    SearchAlreadyOpen,
    #[error("no search in progress")]
    NoSearchOpen,
    #[error("invalid tag type specified")]
    InvalidTag,
}

/// Everything a connection can fail with.
#[derive(Debug, Error)]
pub enum MpdError {
    #[error("host \"{host}\" not found")]
    UnknownHost {
        host: String,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("system error: {0}")]
    System(#[source] std::io::Error),
    #[error("problems connecting to {addr}: {source}")]
    ConnectionPort {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("mpd not running on port: {greeting}")]
    NotServer { greeting: String },
    #[error("timeout in attempting to get a response from server")]
    NoResponse,
    #[error("timeout while talking to server")]
    Timeout,
    #[error("connection closed by server")]
    ConnectionClosed,
    #[error("buffer overrun: line exceeds {capacity} bytes")]
    BufferOverrun { capacity: usize },
    #[error("problems giving command to server: {0}")]
    Send(#[source] std::io::Error),
    #[error("error parsing response: {0}")]
    Decode(String),
    #[error("server error {0}")]
    Ack(AckError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("connection is no longer usable after {0:?}")]
    Unusable(ErrorKind),
}

/// Copyable classification of an [`MpdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownHost,
    System,
    ConnectionPort,
    NotServer,
    NoResponse,
    Timeout,
    ConnectionClosed,
    BufferOverrun,
    Send,
    Decode,
    Ack,
    Sequence,
    Unusable,
}

impl MpdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MpdError::UnknownHost { .. } => ErrorKind::UnknownHost,
            MpdError::System(_) => ErrorKind::System,
            MpdError::ConnectionPort { .. } => ErrorKind::ConnectionPort,
            MpdError::NotServer { .. } => ErrorKind::NotServer,
            MpdError::NoResponse => ErrorKind::NoResponse,
            MpdError::Timeout => ErrorKind::Timeout,
            MpdError::ConnectionClosed => ErrorKind::ConnectionClosed,
            MpdError::BufferOverrun { .. } => ErrorKind::BufferOverrun,
            MpdError::Send(_) => ErrorKind::Send,
            MpdError::Decode(_) => ErrorKind::Decode,
            MpdError::Ack(_) => ErrorKind::Ack,
            MpdError::Sequence(_) => ErrorKind::Sequence,
            MpdError::Unusable(_) => ErrorKind::Unusable,
        }
    }

    /// Transport and framing failures leave the stream in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout
                | ErrorKind::ConnectionClosed
                | ErrorKind::BufferOverrun
                | ErrorKind::Send
        )
    }

    pub fn ack(&self) -> Option<&AckError> {
        match self {
            MpdError::Ack(ack) => Some(ack),
            _ => None,
        }
    }
}

pub type MpdResult<T> = Result<T, MpdError>;

/// The last failure recorded on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
    pub ack: Option<AckError>,
}

impl From<&MpdError> for ErrorState {
    fn from(err: &MpdError) -> Self {
        Self {
            kind: err.kind(),
            message: match err {
                MpdError::Ack(ack) => ack.message.clone(),
                other => other.to_string(),
            },
            ack: err.ack().cloned(),
        }
    }
}
