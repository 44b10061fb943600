//! Blocking client for the Music Player Daemon text protocol.
//!
//! A [`Connection`] owns one socket and allows a single outstanding response.
//! Commands go out with [`Connection::send`] (or one of the typed `send_*`
//! helpers), and the reply is read either raw through
//! [`Connection::next_element`] or record by record through the `read_*`
//! builders. Several commands can be batched with
//! [`Connection::list_ok_begin`] / [`Connection::list_end`].

mod builders;
pub mod command;
mod commands;
pub mod connection;
pub mod element;
pub mod entity;
pub mod error;
pub mod framer;
mod search;
pub mod transport;

pub use command::{escape_arg, Command, TagKind};
pub use connection::{
    parse_greeting, ConnectOptions, Connection, ListMode, Reply, DEFAULT_TIMEOUT,
};
pub use element::Element;
pub use entity::{
    Directory, InfoEntity, Output, PlayState, PlaylistFile, SearchStats, Song, Stats, Status,
};
pub use error::{
    AckCode, AckError, ErrorKind, ErrorState, MpdError, MpdResult, SequenceError,
};
pub use framer::{LineBuffer, DEFAULT_BUFFER_CAPACITY};
pub use transport::Stream;
