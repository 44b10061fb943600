//! Typed readers that fold the element stream into records.
//!
//! Every reader returns `Ok(None)` once the current command's output is
//! exhausted. Errors discard the partly built record.

use crate::command::TagKind;
use crate::connection::Connection;
use crate::element::Element;
use crate::entity::{
    Directory, InfoEntity, Output, PlayState, PlaylistFile, SearchStats, Song, Stats, Status,
};
use crate::error::{MpdError, MpdResult};
use crate::transport::Stream;

/// Keys that open a new record in mixed listings.
const ENTITY_STARTS: [&str; 4] = ["file", "directory", "playlist", "cpos"];

impl<S: Stream> Connection<S> {
    /// Read a `status` reply.
    pub fn read_status(&mut self) -> MpdResult<Option<Status>> {
        if !self.has_records()? {
            return Ok(None);
        }
        let mut status = Status::default();
        let mut state_seen = false;
        while let Some(element) = self.current()? {
            if element.is("state") {
                state_seen = true;
            }
            apply_status_field(&mut status, element);
            self.advance();
        }
        if !state_seen {
            let err = MpdError::Decode("status: state not found".into());
            return Err(self.fail(err));
        }
        Ok(Some(status))
    }

    /// Read a `stats` reply.
    pub fn read_stats(&mut self) -> MpdResult<Option<Stats>> {
        if !self.has_records()? {
            return Ok(None);
        }
        let mut stats = Stats::default();
        while let Some(element) = self.current()? {
            let value = element.value.as_str();
            match element.name.as_str() {
                "artists" => stats.artists = lenient_int("artists", value) as u32,
                "albums" => stats.albums = lenient_int("albums", value) as u32,
                "songs" => stats.songs = lenient_int("songs", value) as u32,
                "uptime" => stats.uptime = lenient_int("uptime", value) as u64,
                "db_update" => stats.db_update = lenient_int("db_update", value) as u64,
                "playtime" => stats.playtime = lenient_int("playtime", value) as u64,
                "db_playtime" => stats.db_playtime = lenient_int("db_playtime", value) as u64,
                _ => {}
            }
            self.advance();
        }
        Ok(Some(stats))
    }

    /// Read a `count` reply.
    pub fn read_search_stats(&mut self) -> MpdResult<Option<SearchStats>> {
        if !self.has_records()? {
            return Ok(None);
        }
        let mut stats = SearchStats::default();
        while let Some(element) = self.current()? {
            let value = element.value.as_str();
            match element.name.as_str() {
                "songs" => stats.songs = lenient_int("songs", value) as u32,
                "playtime" => stats.playtime = lenient_int("playtime", value) as u64,
                _ => {}
            }
            self.advance();
        }
        Ok(Some(stats))
    }

    /// Next song, directory or stored playlist from a listing. A `cpos` key
    /// (from `plchangesposid`) yields a song carrying only position and id.
    pub fn read_next_info_entity(&mut self) -> MpdResult<Option<InfoEntity>> {
        if !self.has_records()? {
            return Ok(None);
        }
        let Some(first) = self.current()? else {
            return Ok(None);
        };
        let (name, value) = (first.name.clone(), first.value.clone());
        let mut entity = match name.as_str() {
            "file" => InfoEntity::Song(Song::new(value)),
            "directory" => InfoEntity::Directory(Directory { path: value }),
            "playlist" => InfoEntity::PlaylistFile(PlaylistFile { path: value }),
            "cpos" => {
                let mut stub = Song::new(String::new());
                stub.pos = lenient_int("cpos", &value) as i32;
                InfoEntity::Song(stub)
            }
            other => {
                let message = format!("problem parsing song info: unexpected \"{other}\"");
                return Err(self.fail(MpdError::Decode(message)));
            }
        };
        self.advance();

        while let Some(element) = self.current()? {
            if ENTITY_STARTS.contains(&element.name.as_str()) {
                break;
            }
            if let InfoEntity::Song(song) = &mut entity {
                apply_song_field(song, element);
            }
            self.advance();
        }
        Ok(Some(entity))
    }

    /// Next song of a listing, skipping directories and playlists.
    pub fn read_next_song(&mut self) -> MpdResult<Option<Song>> {
        while let Some(entity) = self.read_next_info_entity()? {
            if let InfoEntity::Song(song) = entity {
                return Ok(Some(song));
            }
        }
        Ok(None)
    }

    /// Next audio output from an `outputs` reply.
    pub fn read_next_output(&mut self) -> MpdResult<Option<Output>> {
        if !self.has_records()? {
            return Ok(None);
        }
        let mut output = Output::default();
        while let Some(element) = self.current()? {
            let value = element.value.as_str();
            match element.name.as_str() {
                "outputid" => {
                    if output.id >= 0 {
                        break;
                    }
                    output.id = lenient_int("outputid", value) as i32;
                }
                "outputname" if output.name.is_none() => output.name = Some(value.to_string()),
                "outputenabled" => output.enabled = lenient_int("outputenabled", value) != 0,
                _ => {}
            }
            self.advance();
        }
        Ok((output.id >= 0).then_some(output))
    }

    /// Value of the next element called `name`, skipping any others.
    pub fn read_next_value(&mut self, name: &str) -> MpdResult<Option<String>> {
        if !self.has_records()? {
            return Ok(None);
        }
        while let Some(element) = self.current()? {
            let found = element.is(name).then(|| element.value.clone());
            self.advance();
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    pub fn read_next_artist(&mut self) -> MpdResult<Option<String>> {
        self.read_next_value(TagKind::Artist.as_str())
    }

    pub fn read_next_album(&mut self) -> MpdResult<Option<String>> {
        self.read_next_value(TagKind::Album.as_str())
    }

    /// Next value of `tag` from a `list` reply.
    pub fn read_next_tag(&mut self, tag: TagKind) -> MpdResult<Option<String>> {
        self.read_next_value(tag.as_str())
    }

    /// Next entry of a `commands` or `notcommands` reply.
    pub fn read_next_command(&mut self) -> MpdResult<Option<String>> {
        self.read_next_value("command")
    }

    /// Next entry of a `tagtypes` reply.
    pub fn read_next_tag_type(&mut self) -> MpdResult<Option<String>> {
        self.read_next_value("tagtype")
    }

    /// Next entry of a `urlhandlers` reply.
    pub fn read_next_url_handler(&mut self) -> MpdResult<Option<String>> {
        self.read_next_value("handler")
    }
}

fn apply_status_field(status: &mut Status, element: &Element) {
    let name = element.name.as_str();
    let value = element.value.as_str();
    match name {
        "volume" => status.volume = lenient_int(name, value) as i32,
        "repeat" => status.repeat = lenient_int(name, value) != 0,
        "random" => status.random = lenient_int(name, value) != 0,
        "single" => status.single = lenient_int(name, value) != 0,
        "consume" => status.consume = lenient_int(name, value) != 0,
        "playlist" => status.playlist = lenient_int(name, value),
        "playlistlength" => status.playlist_length = lenient_int(name, value) as i32,
        "bitrate" => status.bitrate = lenient_int(name, value) as u32,
        "state" => status.state = PlayState::from_wire(value),
        "song" => status.song = lenient_int(name, value) as i32,
        "songid" => status.song_id = lenient_int(name, value) as i32,
        "nextsong" => status.next_song = lenient_int(name, value) as i32,
        "nextsongid" => status.next_song_id = lenient_int(name, value) as i32,
        "time" => {
            let (elapsed, total) = value.split_once(':').unwrap_or((value, ""));
            status.elapsed_time = lenient_int(name, elapsed) as u32;
            status.total_time = lenient_int(name, total) as u32;
        }
        "elapsed" => status.elapsed_ms = (lenient_float(name, value) * 1000.0) as u64,
        "error" => status.error = Some(value.to_string()),
        "xfade" => status.crossfade = lenient_int(name, value) as i32,
        "updating_db" => status.updating_db = lenient_int(name, value) as u32,
        "audio" => {
            let mut parts = value.splitn(3, ':');
            status.sample_rate = lenient_int(name, parts.next().unwrap_or("")) as u32;
            status.bits = lenient_int(name, parts.next().unwrap_or("")) as u32;
            status.channels = lenient_int(name, parts.next().unwrap_or("")) as u32;
        }
        _ => {}
    }
}

/// Fold one tag into `song`. Empty values are ignored and the first value of
/// a repeated tag wins.
fn apply_song_field(song: &mut Song, element: &Element) {
    let value = element.value.as_str();
    if value.is_empty() {
        return;
    }
    let slot = match element.name.as_str() {
        "Artist" => &mut song.artist,
        "AlbumArtist" => &mut song.album_artist,
        "Album" => &mut song.album,
        "Title" => &mut song.title,
        "Track" => &mut song.track,
        "Name" => &mut song.name,
        "Date" => &mut song.date,
        "Genre" => &mut song.genre,
        "Composer" => &mut song.composer,
        "Performer" => &mut song.performer,
        "Disc" => &mut song.disc,
        "Comment" => &mut song.comment,
        "Time" if song.time == Song::NO_TIME => {
            song.time = lenient_int("Time", value) as i32;
            return;
        }
        "Pos" if song.pos == Song::NO_POSITION => {
            song.pos = lenient_int("Pos", value) as i32;
            return;
        }
        "Id" if song.id == Song::NO_ID => {
            song.id = lenient_int("Id", value) as i32;
            return;
        }
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// Leading-integer parse in the manner of C `atoi`: junk yields 0.
pub(crate) fn lenient_int(field: &str, value: &str) -> i64 {
    let trimmed = value.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    match trimmed[..end].parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::debug!(field, value, "non-numeric value read as 0");
            0
        }
    }
}

fn lenient_float(field: &str, value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => n,
        _ => {
            tracing::debug!(field, value, "non-numeric value read as 0");
            0.0
        }
    }
}
