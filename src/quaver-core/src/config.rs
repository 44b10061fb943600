use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

/// Smallest receive buffer accepted; shorter buffers cannot hold a typical
/// song record line.
pub const MIN_BUFFER_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Look the password up in the OS keyring under `host:port`.
    #[serde(default)]
    pub password_in_keyring: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            buffer_capacity: default_buffer_capacity(),
            password_in_keyring: false,
        }
    }
}

/// Where to connect, after environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Password given inline as `MPD_HOST=password@host`.
    pub password: Option<String>,
}

impl ServerConfig {
    /// The configured timeout; unrepresentable values fall back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout_secs()))
    }

    /// Apply `MPD_HOST` and `MPD_PORT` as looked up through `env`.
    pub fn endpoint_with<F>(&self, env: F) -> Result<Endpoint, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut endpoint = Endpoint {
            host: self.host.clone(),
            port: self.port,
            password: None,
        };

        if let Some(value) = env("MPD_HOST").filter(|v| !v.is_empty()) {
            match value.rsplit_once('@') {
                Some((password, host)) if !host.is_empty() => {
                    endpoint.host = host.to_string();
                    endpoint.password = (!password.is_empty()).then(|| password.to_string());
                }
                _ => endpoint.host = value,
            }
        }

        if let Some(value) = env("MPD_PORT").filter(|v| !v.is_empty()) {
            endpoint.port = value
                .trim()
                .parse()
                .map_err(|_| ValidationError::InvalidPort { value })?;
        }

        Ok(endpoint)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log lines to stderr; stdout is reserved for command output.
    #[serde(default)]
    pub console: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            console: false,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("server.host must not be empty")]
    EmptyHost,
    #[error("server.timeout_secs must be a positive number of seconds, got {found}")]
    InvalidTimeout { found: f64 },
    #[error("server.buffer_capacity must be at least {minimum} bytes, got {found}")]
    BufferTooSmall { found: usize, minimum: usize },
    #[error("MPD_PORT is not a port number: {value:?}")]
    InvalidPort { value: String },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        let server = &self.server;
        if server.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if !(server.timeout_secs.is_finite() && server.timeout_secs > 0.0) {
            return Err(ValidationError::InvalidTimeout {
                found: server.timeout_secs,
            });
        }
        if server.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(ValidationError::BufferTooSmall {
                found: server.buffer_capacity,
                minimum: MIN_BUFFER_CAPACITY,
            });
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6600
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_buffer_capacity() -> usize {
    50_000
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}
