//! Command lines as sent on the wire.

use crate::error::SequenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backslash-escape `"` and `\` so the value can sit inside double quotes.
pub fn escape_arg(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A single protocol command, formatted as `name "arg1" "arg2"\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            line: name.to_string(),
        }
    }

    /// Append a quoted, escaped argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.line.push_str(" \"");
        self.line.push_str(&escape_arg(&value.to_string()));
        self.line.push('"');
        self
    }

    /// Append a bare word, such as a tag name that the server expects unquoted.
    pub fn word(mut self, word: &str) -> Self {
        self.line.push(' ');
        self.line.push_str(word);
        self
    }

    pub fn tag(self, tag: TagKind, value: &str) -> Self {
        self.word(tag.as_str()).arg(value)
    }

    /// The full line, newline included.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.line)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Song metadata keys usable in searches and `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Artist,
    Album,
    AlbumArtist,
    Title,
    Track,
    Name,
    Genre,
    Date,
    Composer,
    Performer,
    Comment,
    Disc,
    File,
    Any,
}

impl TagKind {
    pub const ALL: [TagKind; 14] = [
        TagKind::Artist,
        TagKind::Album,
        TagKind::AlbumArtist,
        TagKind::Title,
        TagKind::Track,
        TagKind::Name,
        TagKind::Genre,
        TagKind::Date,
        TagKind::Composer,
        TagKind::Performer,
        TagKind::Comment,
        TagKind::Disc,
        TagKind::File,
        TagKind::Any,
    ];

    /// Key used in commands and in response lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Artist => "Artist",
            TagKind::Album => "Album",
            TagKind::AlbumArtist => "AlbumArtist",
            TagKind::Title => "Title",
            TagKind::Track => "Track",
            TagKind::Name => "Name",
            TagKind::Genre => "Genre",
            TagKind::Date => "Date",
            TagKind::Composer => "Composer",
            TagKind::Performer => "Performer",
            TagKind::Comment => "Comment",
            TagKind::Disc => "Disc",
            TagKind::File => "file",
            TagKind::Any => "any",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagKind {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        TagKind::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(&lowered))
            .or(match lowered.as_str() {
                "filename" => Some(TagKind::File),
                "albumartist" | "album_artist" => Some(TagKind::AlbumArtist),
                _ => None,
            })
            .ok_or(SequenceError::InvalidTag)
    }
}
