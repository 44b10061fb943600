//! Typed records decoded from response streams.
//!
//! Fields the protocol may omit keep the historical sentinel values (`-1` and
//! friends) instead of `Option`, so callers must check them before use.

use serde::{Deserialize, Serialize};

/// Player state as reported by `state:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Stop,
    Play,
    Pause,
    #[default]
    Unknown,
}

impl PlayState {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "play" => PlayState::Play,
            "stop" => PlayState::Stop,
            "pause" => PlayState::Pause,
            _ => PlayState::Unknown,
        }
    }
}

/// Reply to `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// 0-100, or [`Status::NO_VOLUME`] when the server has no mixer.
    pub volume: i32,
    pub repeat: bool,
    pub random: bool,
    pub single: bool,
    pub consume: bool,
    /// Playlist version, `-1` if not reported.
    pub playlist: i64,
    /// `-1` if not reported.
    pub playlist_length: i32,
    pub state: PlayState,
    /// Position of the current song; only meaningful while playing or paused.
    pub song: i32,
    pub song_id: i32,
    pub next_song: i32,
    pub next_song_id: i32,
    pub elapsed_time: u32,
    /// Sub-second elapsed time from `elapsed:`, when the server sends it.
    pub elapsed_ms: u64,
    pub total_time: u32,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub bits: u32,
    pub channels: u32,
    /// `-1` if not reported.
    pub crossfade: i32,
    pub error: Option<String>,
    /// Non-zero while a database update job runs.
    pub updating_db: u32,
}

impl Status {
    pub const NO_VOLUME: i32 = -1;
}

impl Default for Status {
    fn default() -> Self {
        Self {
            volume: Status::NO_VOLUME,
            repeat: false,
            random: false,
            single: false,
            consume: false,
            playlist: -1,
            playlist_length: -1,
            state: PlayState::Unknown,
            song: 0,
            song_id: 0,
            next_song: -1,
            next_song_id: -1,
            elapsed_time: 0,
            elapsed_ms: 0,
            total_time: 0,
            bitrate: 0,
            sample_rate: 0,
            bits: 0,
            channels: 0,
            crossfade: -1,
            error: None,
            updating_db: 0,
        }
    }
}

/// Reply to `stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub artists: u32,
    pub albums: u32,
    pub songs: u32,
    pub uptime: u64,
    /// Unix timestamp of the last database update.
    pub db_update: u64,
    pub playtime: u64,
    pub db_playtime: u64,
}

/// Reply to `count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub songs: u32,
    pub playtime: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Path relative to the music directory; also the song's identity. Empty
    /// only for position-only stubs from `plchangesposid`.
    pub file: String,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,
    pub composer: Option<String>,
    pub performer: Option<String>,
    pub disc: Option<String>,
    pub comment: Option<String>,
    /// Seconds, or [`Song::NO_TIME`].
    pub time: i32,
    /// Queue position, or [`Song::NO_POSITION`].
    pub pos: i32,
    /// Queue id, or [`Song::NO_ID`].
    pub id: i32,
}

impl Song {
    pub const NO_TIME: i32 = -1;
    pub const NO_POSITION: i32 = -1;
    pub const NO_ID: i32 = -1;

    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            artist: None,
            album_artist: None,
            album: None,
            title: None,
            track: None,
            name: None,
            date: None,
            genre: None,
            composer: None,
            performer: None,
            disc: None,
            comment: None,
            time: Song::NO_TIME,
            pos: Song::NO_POSITION,
            id: Song::NO_ID,
        }
    }

    pub fn has_time(&self) -> bool {
        self.time != Song::NO_TIME
    }

    pub fn in_queue(&self) -> bool {
        self.pos != Song::NO_POSITION
    }

    /// Title if tagged, otherwise the `name` tag, otherwise the file's base name.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_else(|| self.file.rsplit('/').next().unwrap_or(&self.file))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistFile {
    pub path: String,
}

/// One record from a mixed listing (`lsinfo`, `listallinfo`, searches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InfoEntity {
    Song(Song),
    Directory(Directory),
    PlaylistFile(PlaylistFile),
}

impl InfoEntity {
    pub fn as_song(&self) -> Option<&Song> {
        match self {
            InfoEntity::Song(song) => Some(song),
            _ => None,
        }
    }

    pub fn into_song(self) -> Option<Song> {
        match self {
            InfoEntity::Song(song) => Some(song),
            _ => None,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            InfoEntity::Song(song) => &song.file,
            InfoEntity::Directory(dir) => &dir.path,
            InfoEntity::PlaylistFile(playlist) => &playlist.path,
        }
    }
}

/// A configured audio output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// `-1` until `outputid` has been seen.
    pub id: i32,
    pub name: Option<String>,
    pub enabled: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            id: -1,
            name: None,
            enabled: false,
        }
    }
}
