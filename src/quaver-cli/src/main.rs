use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quaver_client::{
    Command as MpdCommand, ConnectOptions, Connection, InfoEntity, Output, SearchStats, Song,
    Stats, Status, TagKind,
};
use quaver_core::redact::redact_host_spec;
use quaver_core::{init_logging, AppDirs, Config, CredentialStore, ValidationError};
use serde::Serialize;
use std::io::BufRead;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "quaver", version, about = "Query and control a Music Player Daemon")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args, Default)]
struct ServerArgs {
    /// Server host (overrides MPD_HOST and config)
    #[arg(long, global = true)]
    host: Option<String>,
    /// Server port (overrides MPD_PORT and config)
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Connect/read/write timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Query(Query),
    /// Manage the server password stored in the OS keyring
    #[command(subcommand)]
    Password(PasswordCommand),
}

/// Subcommands that talk to the server.
#[derive(Debug, Subcommand)]
enum Query {
    /// Player status
    Status,
    /// Database statistics
    Stats,
    /// The song being played
    Current,
    /// List a database directory
    Ls { path: Option<String> },
    /// Search the database with TAG=VALUE filters
    Search {
        /// Match whole values exactly (find) instead of substrings (search)
        #[arg(long)]
        exact: bool,
        #[arg(required = true, value_name = "TAG=VALUE")]
        filters: Vec<String>,
    },
    /// Distinct values of one tag, optionally filtered
    List {
        tag: String,
        #[arg(value_name = "TAG=VALUE")]
        filters: Vec<String>,
    },
    /// Number of songs and total playtime matching the filters
    Count {
        #[arg(required = true, value_name = "TAG=VALUE")]
        filters: Vec<String>,
    },
    /// Audio outputs
    Outputs,
    /// The current queue
    Playlist,
    /// Send any command and print the reply pairs
    Raw {
        command: String,
        args: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum PasswordCommand {
    /// Store a password (read from stdin when omitted)
    Set { password: Option<String> },
    /// Remove the stored password
    Clear,
}

#[derive(Debug, Error, PartialEq)]
enum CliError {
    #[error("filter {0:?} is not of the form TAG=VALUE")]
    MalformedFilter(String),
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
    #[error("--timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
    #[error("{0}")]
    Config(#[from] ValidationError),
}

/// Everything needed to open and authenticate a connection.
#[derive(Debug, Clone, PartialEq)]
struct Target {
    host: String,
    port: u16,
    password: Option<String>,
    options: ConnectOptions,
}

impl ServerArgs {
    /// Layer command-line flags over the environment over the config file.
    fn resolve<F>(&self, config: &Config, env: F) -> Result<Target, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = config.server.endpoint_with(env)?;
        let timeout = match self.timeout {
            Some(secs) => {
                Duration::try_from_secs_f64(secs).map_err(|_| CliError::InvalidTimeout(secs))?
            }
            None => config.server.timeout(),
        };
        if timeout.is_zero() {
            return Err(CliError::InvalidTimeout(self.timeout.unwrap_or_default()));
        }

        Ok(Target {
            host: self.host.clone().unwrap_or(endpoint.host),
            port: self.port.unwrap_or(endpoint.port),
            password: endpoint.password,
            options: ConnectOptions {
                timeout,
                buffer_capacity: config.server.buffer_capacity,
            },
        })
    }
}

fn parse_filter(raw: &str) -> Result<(TagKind, String), CliError> {
    let (tag, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::MalformedFilter(raw.to_string()))?;
    Ok((parse_tag(tag)?, value.to_string()))
}

fn parse_tag(raw: &str) -> Result<TagKind, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::UnknownTag(raw.to_string()))
}

fn parse_filters(raw: &[String]) -> Result<Vec<(TagKind, String)>, CliError> {
    raw.iter().map(|f| parse_filter(f)).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, &dirs)?;

    let mut target = cli.server.resolve(&config, |key| std::env::var(key).ok())?;
    if let Ok(spec) = std::env::var("MPD_HOST") {
        tracing::debug!(mpd_host = %redact_host_spec(&spec), "using MPD_HOST");
    }

    let query = match cli.command {
        Command::Password(action) => return manage_password(&action, &target),
        Command::Query(query) => query,
    };

    if target.password.is_none() && config.server.password_in_keyring {
        match CredentialStore::new().find_password(&target.host, target.port) {
            Ok(password) => target.password = password,
            Err(err) => tracing::warn!(error = %err, "keyring lookup failed"),
        }
    }

    tracing::info!(host = %target.host, port = target.port, "connecting");
    let mut conn = Connection::connect(&target.host, target.port, target.options)
        .with_context(|| format!("connecting to {}:{}", target.host, target.port))?;
    if let Some(password) = &target.password {
        conn.password(password).context("authenticating")?;
    }

    run_query(&mut conn, query, cli.json)?;
    conn.close()?;
    Ok(())
}

fn run_query(conn: &mut Connection, query: Query, json: bool) -> Result<()> {
    match query {
        Query::Status => emit(json, &conn.status()?, render_status),
        Query::Stats => emit(json, &conn.stats()?, render_stats),
        Query::Current => match conn.current_song()? {
            Some(song) => emit(json, &song, render_song),
            None if json => println!("null"),
            None => println!("nothing playing"),
        },
        Query::Ls { path } => {
            let entities = conn.list_info(path.as_deref().unwrap_or(""))?;
            emit_all(json, &entities, render_entity);
        }
        Query::Search { exact, filters } => {
            let filters = parse_filters(&filters)?;
            conn.start_search(exact)?;
            for (tag, value) in &filters {
                conn.add_constraint(*tag, value)?;
            }
            conn.commit_search()?;
            let mut songs = Vec::new();
            while let Some(song) = conn.read_next_song()? {
                songs.push(song);
            }
            conn.finish_command()?;
            emit_all(json, &songs, render_song);
        }
        Query::List { tag, filters } => {
            let tag = parse_tag(&tag)?;
            let filters = parse_filters(&filters)?;
            conn.start_field_search(tag)?;
            for (filter_tag, value) in &filters {
                conn.add_constraint(*filter_tag, value)?;
            }
            conn.commit_search()?;
            let mut values = Vec::new();
            while let Some(value) = conn.read_next_tag(tag)? {
                values.push(value);
            }
            conn.finish_command()?;
            emit_all(json, &values, String::clone);
        }
        Query::Count { filters } => {
            let filters = parse_filters(&filters)?;
            conn.start_stats_search()?;
            for (tag, value) in &filters {
                conn.add_constraint(*tag, value)?;
            }
            conn.commit_search()?;
            let stats = conn.read_search_stats()?.unwrap_or_default();
            conn.finish_command()?;
            emit(json, &stats, render_search_stats);
        }
        Query::Outputs => emit_all(json, &conn.outputs()?, render_output),
        Query::Playlist => emit_all(json, &conn.queue()?, render_song),
        Query::Raw { command, args } => {
            let request = args
                .iter()
                .fold(MpdCommand::new(&command), |cmd, arg| cmd.arg(arg));
            let elements = conn.run(&request)?;
            emit_all(json, &elements, |e| format!("{}: {}", e.name, e.value));
        }
    }
    Ok(())
}

fn manage_password(action: &PasswordCommand, target: &Target) -> Result<()> {
    let store = CredentialStore::new();
    match action {
        PasswordCommand::Set { password } => {
            let password = match password {
                Some(password) => password.clone(),
                None => {
                    let mut line = String::new();
                    std::io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("reading password from stdin")?;
                    line.trim_end_matches(['\r', '\n']).to_string()
                }
            };
            store.store_password(&target.host, target.port, &password)?;
            println!("stored password for {}:{}", target.host, target.port);
        }
        PasswordCommand::Clear => {
            store.delete_password(&target.host, target.port)?;
            println!("cleared password for {}:{}", target.host, target.port);
        }
    }
    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl Fn(&T) -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => tracing::error!(error = %err, "failed to encode output"),
        }
    } else {
        println!("{}", render(value));
    }
}

fn emit_all<T: Serialize>(json: bool, values: &[T], render: impl Fn(&T) -> String) {
    if json {
        emit(json, &values, |_| String::new());
    } else {
        for value in values {
            println!("{}", render(value));
        }
    }
}

fn render_status(status: &Status) -> String {
    let mut lines = vec![format!("state: {:?}", status.state).to_lowercase()];
    if status.volume == Status::NO_VOLUME {
        lines.push("volume: n/a".into());
    } else {
        lines.push(format!("volume: {}%", status.volume));
    }
    let flag = |on: bool| if on { "on" } else { "off" };
    lines.push(format!(
        "repeat: {}  random: {}  single: {}  consume: {}",
        flag(status.repeat),
        flag(status.random),
        flag(status.single),
        flag(status.consume)
    ));
    if status.playlist_length >= 0 {
        lines.push(format!("queue: {} songs", status.playlist_length));
    }
    if status.total_time > 0 {
        lines.push(format!(
            "time: {} / {}",
            clock(status.elapsed_time as u64),
            clock(status.total_time as u64)
        ));
    }
    if status.updating_db != 0 {
        lines.push(format!("updating database (job {})", status.updating_db));
    }
    if let Some(error) = &status.error {
        lines.push(format!("error: {error}"));
    }
    lines.join("\n")
}

fn render_stats(stats: &Stats) -> String {
    format!(
        "artists: {}\nalbums: {}\nsongs: {}\nplaytime: {}\nuptime: {}\ndb playtime: {}",
        stats.artists,
        stats.albums,
        stats.songs,
        clock(stats.playtime),
        clock(stats.uptime),
        clock(stats.db_playtime)
    )
}

fn render_search_stats(stats: &SearchStats) -> String {
    format!("songs: {}\nplaytime: {}", stats.songs, clock(stats.playtime))
}

fn render_song(song: &Song) -> String {
    let mut line = String::new();
    if song.in_queue() {
        line.push_str(&format!("{:>4}  ", song.pos + 1));
    }
    if let Some(artist) = &song.artist {
        line.push_str(artist);
        line.push_str(" - ");
    }
    line.push_str(song.display_title());
    if song.has_time() {
        line.push_str(&format!(" [{}]", clock(song.time as u64)));
    }
    line
}

fn render_entity(entity: &InfoEntity) -> String {
    match entity {
        InfoEntity::Directory(dir) => format!("dir   {}", dir.path),
        InfoEntity::PlaylistFile(playlist) => format!("list  {}", playlist.path),
        InfoEntity::Song(song) => format!("file  {}", song.file),
    }
}

fn render_output(output: &Output) -> String {
    format!(
        "{}  [{}] {}",
        output.id,
        if output.enabled { "x" } else { " " },
        output.name.as_deref().unwrap_or("(unnamed)")
    )
}

/// Seconds as `m:ss`, or `h:mm:ss` from one hour up.
fn clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use quaver_client::PlayState;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_requires_filters() {
        assert!(Cli::try_parse_from(["quaver", "search"]).is_err());
        let cli = Cli::try_parse_from(["quaver", "search", "--exact", "artist=Queen"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Query(Query::Search { exact: true, ref filters }) if filters == &["artist=Queen"]
        ));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["quaver", "status", "--host", "jukebox", "--port", "6601"])
                .unwrap();
        assert_eq!(cli.server.host.as_deref(), Some("jukebox"));
        assert_eq!(cli.server.port, Some(6601));
    }

    #[test]
    fn filters_split_on_first_equals() {
        assert_eq!(
            parse_filter("title=a=b").unwrap(),
            (TagKind::Title, "a=b".to_string())
        );
        assert_eq!(
            parse_filter("Artist").unwrap_err(),
            CliError::MalformedFilter("Artist".into())
        );
        assert_eq!(
            parse_filter("mood=happy").unwrap_err(),
            CliError::UnknownTag("mood".into())
        );
    }

    #[test]
    fn flags_override_environment_and_config() {
        let config = Config::default();
        let args = ServerArgs {
            host: None,
            port: Some(7000),
            timeout: Some(0.5),
        };
        let env = |key: &str| (key == "MPD_HOST").then(|| "pw@jukebox".to_string());
        let target = args.resolve(&config, env).unwrap();
        assert_eq!(target.host, "jukebox");
        assert_eq!(target.port, 7000);
        assert_eq!(target.password.as_deref(), Some("pw"));
        assert_eq!(target.options.timeout, Duration::from_millis(500));
        assert_eq!(target.options.buffer_capacity, 50_000);
    }

    #[test]
    fn defaults_come_from_config() {
        let target = ServerArgs::default()
            .resolve(&Config::default(), no_env)
            .unwrap();
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 6600);
        assert_eq!(target.password, None);
        assert_eq!(target.options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn non_positive_timeout_rejected() {
        for secs in [0.0, -1.0] {
            let args = ServerArgs {
                timeout: Some(secs),
                ..ServerArgs::default()
            };
            assert!(matches!(
                args.resolve(&Config::default(), no_env),
                Err(CliError::InvalidTimeout(_))
            ));
        }
    }

    #[test]
    fn clock_formats() {
        assert_eq!(clock(59), "0:59");
        assert_eq!(clock(240), "4:00");
        assert_eq!(clock(3725), "1:02:05");
    }

    #[test]
    fn status_rendering() {
        let status = Status {
            volume: 50,
            repeat: true,
            state: PlayState::Play,
            elapsed_time: 12,
            total_time: 240,
            ..Status::default()
        };
        let text = render_status(&status);
        assert!(text.starts_with("state: play\nvolume: 50%"));
        assert!(text.contains("repeat: on  random: off"));
        assert!(text.contains("time: 0:12 / 4:00"));
        assert!(!text.contains("queue"));
    }

    #[test]
    fn song_rendering_uses_fallbacks() {
        let mut song = Song::new("Queen/Jazz/01 Mustapha.flac");
        song.pos = 0;
        song.time = 183;
        assert_eq!(render_song(&song), "   1  01 Mustapha.flac [3:03]");
        song.artist = Some("Queen".into());
        song.title = Some("Mustapha".into());
        song.pos = Song::NO_POSITION;
        assert_eq!(render_song(&song), "Queen - Mustapha [3:03]");
    }
}
