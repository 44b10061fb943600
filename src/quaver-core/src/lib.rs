pub mod config;
pub mod logging;
pub mod paths;
pub mod redact;
pub mod secrets;

pub use config::{Config, ConfigError, Endpoint, LogLevel, LoggingConfig, ServerConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use secrets::{CredentialStore, SecretsError};

pub const APP_NAME: &str = "quaver";
pub const APP_AUTHOR: &str = "Quaver";
pub const APP_QUALIFIER: &str = "io";
