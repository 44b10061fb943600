//! Incremental construction of filtered queries.
//!
//! ```rust,ignore
//! conn.start_search(true)?;
//! conn.add_constraint(TagKind::Artist, "Queen")?;
//! conn.add_constraint(TagKind::Album, "Jazz")?;
//! conn.commit_search()?; // find Artist "Queen" Album "Jazz"
//! while let Some(song) = conn.read_next_song()? { /* ... */ }
//! ```

use crate::command::{escape_arg, TagKind};
use crate::connection::Connection;
use crate::error::{MpdResult, SequenceError};
use crate::transport::Stream;

impl<S: Stream> Connection<S> {
    /// Begin a song search: `find` when `exact`, `search` otherwise.
    pub fn start_search(&mut self, exact: bool) -> MpdResult<()> {
        self.open_search(if exact { "find" } else { "search" }.to_string())
    }

    /// Begin a `list <tag>` query for the distinct values of `tag`.
    pub fn start_field_search(&mut self, tag: TagKind) -> MpdResult<()> {
        self.open_search(format!("list {}", tag.as_str()))
    }

    /// Begin a search restricted to the current queue.
    pub fn start_playlist_search(&mut self, exact: bool) -> MpdResult<()> {
        self.open_search(if exact { "playlistfind" } else { "playlistsearch" }.to_string())
    }

    /// Begin a `count` query; read the result with `read_search_stats`.
    pub fn start_stats_search(&mut self) -> MpdResult<()> {
        self.open_search("count".to_string())
    }

    pub fn add_constraint(&mut self, tag: TagKind, value: &str) -> MpdResult<()> {
        match self.search.as_mut() {
            Some(request) => {
                request.push(' ');
                request.push_str(tag.as_str());
                request.push_str(" \"");
                request.push_str(&escape_arg(value));
                request.push('"');
                Ok(())
            }
            None => Err(self.fail(SequenceError::NoSearchOpen.into())),
        }
    }

    /// Like [`add_constraint`](Self::add_constraint) with the tag given by name.
    pub fn add_constraint_named(&mut self, tag: &str, value: &str) -> MpdResult<()> {
        if self.search.is_none() {
            return Err(self.fail(SequenceError::NoSearchOpen.into()));
        }
        match tag.parse::<TagKind>() {
            Ok(tag) => self.add_constraint(tag, value),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Send the assembled query. The builder is cleared whether or not the
    /// send succeeds.
    pub fn commit_search(&mut self) -> MpdResult<()> {
        let Some(mut request) = self.search.take() else {
            return Err(self.fail(SequenceError::NoSearchOpen.into()));
        };
        request.push('\n');
        self.execute(&request)
    }

    /// Drop an open search without sending it.
    pub fn cancel_search(&mut self) {
        self.search = None;
    }

    /// The query assembled so far, without the trailing newline.
    pub fn pending_search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    fn open_search(&mut self, request: String) -> MpdResult<()> {
        self.ensure_usable()?;
        if self.search.is_some() {
            return Err(self.fail(SequenceError::SearchAlreadyOpen.into()));
        }
        self.search = Some(request);
        Ok(())
    }
}
