//! Typed senders for the classic command set, plus a few round trips that
//! send, read and drain in one call.

use crate::command::{Command, TagKind};
use crate::connection::Connection;
use crate::entity::{InfoEntity, Output, Song, Stats, Status};
use crate::error::{MpdError, MpdResult};
use crate::transport::Stream;

impl<S: Stream> Connection<S> {
    // Queries.

    pub fn send_status(&mut self) -> MpdResult<()> {
        self.send(&Command::new("status"))
    }

    pub fn send_stats(&mut self) -> MpdResult<()> {
        self.send(&Command::new("stats"))
    }

    pub fn send_current_song(&mut self) -> MpdResult<()> {
        self.send(&Command::new("currentsong"))
    }

    /// `playlistinfo`, for the whole queue or the song at `pos`.
    pub fn send_playlist_info(&mut self, pos: Option<u32>) -> MpdResult<()> {
        let command = Command::new("playlistinfo");
        self.send(&match pos {
            Some(pos) => command.arg(pos),
            None => command,
        })
    }

    pub fn send_playlist_id(&mut self, id: u32) -> MpdResult<()> {
        self.send(&Command::new("playlistid").arg(id))
    }

    /// Songs changed since queue `version`.
    pub fn send_playlist_changes(&mut self, version: i64) -> MpdResult<()> {
        self.send(&Command::new("plchanges").arg(version))
    }

    /// Positions and ids changed since queue `version`; read with
    /// `read_next_info_entity`, which yields position-only songs.
    pub fn send_playlist_changes_pos_id(&mut self, version: i64) -> MpdResult<()> {
        self.send(&Command::new("plchangesposid").arg(version))
    }

    pub fn send_ls_info(&mut self, dir: &str) -> MpdResult<()> {
        self.send(&Command::new("lsinfo").arg(dir))
    }

    pub fn send_list_all(&mut self, dir: &str) -> MpdResult<()> {
        self.send(&Command::new("listall").arg(dir))
    }

    pub fn send_list_all_info(&mut self, dir: &str) -> MpdResult<()> {
        self.send(&Command::new("listallinfo").arg(dir))
    }

    /// `list <tag>`, optionally narrowed to one artist (the legacy album form).
    pub fn send_list(&mut self, tag: TagKind, artist: Option<&str>) -> MpdResult<()> {
        let command = Command::new("list").word(tag.as_str());
        self.send(&match artist {
            Some(artist) => command.arg(artist),
            None => command,
        })
    }

    pub fn send_find(&mut self, tag: TagKind, value: &str) -> MpdResult<()> {
        self.send(&Command::new("find").tag(tag, value))
    }

    pub fn send_search(&mut self, tag: TagKind, value: &str) -> MpdResult<()> {
        self.send(&Command::new("search").tag(tag, value))
    }

    pub fn send_list_playlists(&mut self) -> MpdResult<()> {
        self.send(&Command::new("listplaylists"))
    }

    pub fn send_list_playlist(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("listplaylist").arg(name))
    }

    pub fn send_list_playlist_info(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("listplaylistinfo").arg(name))
    }

    pub fn send_outputs(&mut self) -> MpdResult<()> {
        self.send(&Command::new("outputs"))
    }

    pub fn send_commands(&mut self) -> MpdResult<()> {
        self.send(&Command::new("commands"))
    }

    pub fn send_not_commands(&mut self) -> MpdResult<()> {
        self.send(&Command::new("notcommands"))
    }

    pub fn send_tag_types(&mut self) -> MpdResult<()> {
        self.send(&Command::new("tagtypes"))
    }

    pub fn send_url_handlers(&mut self) -> MpdResult<()> {
        self.send(&Command::new("urlhandlers"))
    }

    // Queue editing.

    pub fn send_add(&mut self, path: &str) -> MpdResult<()> {
        self.send(&Command::new("add").arg(path))
    }

    /// `addid`; the new queue id comes back as `Id:`.
    pub fn send_add_id(&mut self, path: &str) -> MpdResult<()> {
        self.send(&Command::new("addid").arg(path))
    }

    pub fn send_delete(&mut self, pos: u32) -> MpdResult<()> {
        self.send(&Command::new("delete").arg(pos))
    }

    pub fn send_delete_id(&mut self, id: u32) -> MpdResult<()> {
        self.send(&Command::new("deleteid").arg(id))
    }

    pub fn send_clear(&mut self) -> MpdResult<()> {
        self.send(&Command::new("clear"))
    }

    pub fn send_shuffle(&mut self) -> MpdResult<()> {
        self.send(&Command::new("shuffle"))
    }

    pub fn send_move(&mut self, from: u32, to: u32) -> MpdResult<()> {
        self.send(&Command::new("move").arg(from).arg(to))
    }

    pub fn send_move_id(&mut self, id: u32, to: u32) -> MpdResult<()> {
        self.send(&Command::new("moveid").arg(id).arg(to))
    }

    pub fn send_swap(&mut self, first: u32, second: u32) -> MpdResult<()> {
        self.send(&Command::new("swap").arg(first).arg(second))
    }

    pub fn send_swap_id(&mut self, first: u32, second: u32) -> MpdResult<()> {
        self.send(&Command::new("swapid").arg(first).arg(second))
    }

    // Stored playlists.

    pub fn send_save(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("save").arg(name))
    }

    pub fn send_load(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("load").arg(name))
    }

    pub fn send_rm(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("rm").arg(name))
    }

    pub fn send_playlist_clear(&mut self, name: &str) -> MpdResult<()> {
        self.send(&Command::new("playlistclear").arg(name))
    }

    pub fn send_playlist_add(&mut self, name: &str, path: &str) -> MpdResult<()> {
        self.send(&Command::new("playlistadd").arg(name).arg(path))
    }

    pub fn send_playlist_delete(&mut self, name: &str, pos: u32) -> MpdResult<()> {
        self.send(&Command::new("playlistdelete").arg(name).arg(pos))
    }

    pub fn send_playlist_move(&mut self, name: &str, from: u32, to: u32) -> MpdResult<()> {
        self.send(&Command::new("playlistmove").arg(name).arg(from).arg(to))
    }

    // Playback.

    /// `play`, from the current song or the song at `pos`.
    pub fn send_play(&mut self, pos: Option<u32>) -> MpdResult<()> {
        let command = Command::new("play");
        self.send(&match pos {
            Some(pos) => command.arg(pos),
            None => command,
        })
    }

    pub fn send_play_id(&mut self, id: u32) -> MpdResult<()> {
        self.send(&Command::new("playid").arg(id))
    }

    pub fn send_stop(&mut self) -> MpdResult<()> {
        self.send(&Command::new("stop"))
    }

    pub fn send_pause(&mut self, paused: bool) -> MpdResult<()> {
        self.send(&Command::new("pause").arg(u8::from(paused)))
    }

    pub fn send_next(&mut self) -> MpdResult<()> {
        self.send(&Command::new("next"))
    }

    pub fn send_previous(&mut self) -> MpdResult<()> {
        self.send(&Command::new("previous"))
    }

    pub fn send_seek(&mut self, pos: u32, seconds: u32) -> MpdResult<()> {
        self.send(&Command::new("seek").arg(pos).arg(seconds))
    }

    pub fn send_seek_id(&mut self, id: u32, seconds: u32) -> MpdResult<()> {
        self.send(&Command::new("seekid").arg(id).arg(seconds))
    }

    // Options.

    pub fn send_repeat(&mut self, on: bool) -> MpdResult<()> {
        self.send(&Command::new("repeat").arg(u8::from(on)))
    }

    pub fn send_random(&mut self, on: bool) -> MpdResult<()> {
        self.send(&Command::new("random").arg(u8::from(on)))
    }

    pub fn send_single(&mut self, on: bool) -> MpdResult<()> {
        self.send(&Command::new("single").arg(u8::from(on)))
    }

    pub fn send_consume(&mut self, on: bool) -> MpdResult<()> {
        self.send(&Command::new("consume").arg(u8::from(on)))
    }

    pub fn send_set_volume(&mut self, volume: u8) -> MpdResult<()> {
        self.send(&Command::new("setvol").arg(volume.min(100)))
    }

    pub fn send_crossfade(&mut self, seconds: u32) -> MpdResult<()> {
        self.send(&Command::new("crossfade").arg(seconds))
    }

    pub fn send_enable_output(&mut self, id: u32) -> MpdResult<()> {
        self.send(&Command::new("enableoutput").arg(id))
    }

    pub fn send_disable_output(&mut self, id: u32) -> MpdResult<()> {
        self.send(&Command::new("disableoutput").arg(id))
    }

    // Administration.

    /// `update`, for the whole database or below `path`.
    pub fn send_update(&mut self, path: Option<&str>) -> MpdResult<()> {
        let command = Command::new("update");
        self.send(&match path {
            Some(path) => command.arg(path),
            None => command,
        })
    }

    pub fn send_password(&mut self, password: &str) -> MpdResult<()> {
        self.send(&Command::new("password").arg(password))
    }

    pub fn send_ping(&mut self) -> MpdResult<()> {
        self.send(&Command::new("ping"))
    }

    /// Ask the server to hang up; the connection is consumed.
    pub fn send_close(mut self) -> MpdResult<()> {
        self.send(&Command::new("close"))?;
        self.close()
    }

    // Round trips.

    pub fn status(&mut self) -> MpdResult<Status> {
        self.send_status()?;
        let status = self.read_status();
        self.settle(status)?
            .ok_or_else(|| MpdError::Decode("empty status reply".into()))
    }

    pub fn stats(&mut self) -> MpdResult<Stats> {
        self.send_stats()?;
        let stats = self.read_stats();
        self.settle(stats)?
            .ok_or_else(|| MpdError::Decode("empty stats reply".into()))
    }

    /// The song being played, if any.
    pub fn current_song(&mut self) -> MpdResult<Option<Song>> {
        self.send_current_song()?;
        let song = self.read_next_song();
        self.settle(song)
    }

    pub fn outputs(&mut self) -> MpdResult<Vec<Output>> {
        self.send_outputs()?;
        let outputs = self.collect_with(Self::read_next_output);
        self.settle(outputs)
    }

    /// Contents of one database directory.
    pub fn list_info(&mut self, dir: &str) -> MpdResult<Vec<InfoEntity>> {
        self.send_ls_info(dir)?;
        self.collect_entities()
    }

    /// The whole queue.
    pub fn queue(&mut self) -> MpdResult<Vec<Song>> {
        self.send_playlist_info(None)?;
        let songs = self.collect_with(Self::read_next_song);
        self.settle(songs)
    }

    /// Drain the current response as info entities.
    pub fn collect_entities(&mut self) -> MpdResult<Vec<InfoEntity>> {
        let entities = self.collect_with(Self::read_next_info_entity);
        self.settle(entities)
    }

    /// Append `path` to the queue and return its queue id.
    pub fn add_id(&mut self, path: &str) -> MpdResult<i32> {
        self.send_add_id(path)?;
        let id = self.read_next_value("Id");
        self.settle(id)?
            .map(|id| crate::builders::lenient_int("Id", &id) as i32)
            .ok_or_else(|| MpdError::Decode("addid reply without Id".into()))
    }

    /// Start a database update and return its job id.
    pub fn update(&mut self, path: Option<&str>) -> MpdResult<u32> {
        self.send_update(path)?;
        let job = self.read_next_value("updating_db");
        Ok(self
            .settle(job)?
            .map(|job| crate::builders::lenient_int("updating_db", &job) as u32)
            .unwrap_or(0))
    }

    fn collect_with<T>(
        &mut self,
        mut next: impl FnMut(&mut Self) -> MpdResult<Option<T>>,
    ) -> MpdResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = next(self)? {
            items.push(item);
        }
        Ok(items)
    }

    /// Drain what is left of the response after a reader returns. A reader
    /// error wins over anything the drain reports.
    fn settle<T>(&mut self, read: MpdResult<T>) -> MpdResult<T> {
        match read {
            Ok(value) => {
                self.finish_command()?;
                Ok(value)
            }
            Err(err) => {
                if !err.is_fatal() && !matches!(err, MpdError::Ack(_)) {
                    if let Err(drain) = self.finish_command() {
                        tracing::debug!(error = %drain, "draining after failed read");
                    }
                }
                Err(err)
            }
        }
    }

    pub fn ping(&mut self) -> MpdResult<()> {
        self.send_ping()?;
        self.finish_command()
    }

    /// Authenticate; a wrong password surfaces as an ACK.
    pub fn password(&mut self, password: &str) -> MpdResult<()> {
        self.send_password(password)?;
        self.finish_command()
    }
}
