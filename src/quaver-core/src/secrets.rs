//! Server passwords kept in the operating system's credential store.
//!
//! Entries live under the service name "quaver" with one user key per server,
//! `host:port/password`, so config files never hold the password itself.

use thiserror::Error;

const SERVICE_NAME: &str = "quaver";

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("credential not found: {key}")]
    NotFound { key: String },

    #[error("keyring access denied: {0}")]
    AccessDenied(String),

    #[error("keyring unavailable: {0}")]
    Unavailable(String),

    #[error("keyring error: {0}")]
    Other(String),
}

impl From<keyring::Error> for SecretsError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => SecretsError::NotFound {
                key: "unknown".into(),
            },
            keyring::Error::NoStorageAccess(e) => SecretsError::AccessDenied(e.to_string()),
            keyring::Error::PlatformFailure(e) => SecretsError::Unavailable(e.to_string()),
            other => SecretsError::Other(other.to_string()),
        }
    }
}

pub type SecretsResult<T> = Result<T, SecretsError>;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.into(),
        }
    }

    fn build_key(host: &str, port: u16) -> String {
        format!("{}:{}/password", host.to_ascii_lowercase(), port)
    }

    fn entry(&self, key: &str) -> SecretsResult<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }

    pub fn store_password(&self, host: &str, port: u16, password: &str) -> SecretsResult<()> {
        let key = Self::build_key(host, port);
        self.entry(&key)?.set_password(password)?;
        tracing::debug!(server = %key, "stored password in keyring");
        Ok(())
    }

    /// Returns `SecretsError::NotFound` when no password is stored for the server.
    pub fn password(&self, host: &str, port: u16) -> SecretsResult<String> {
        let key = Self::build_key(host, port);
        match self.entry(&key)?.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(SecretsError::NotFound { key }),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`password`](Self::password), with a missing entry as `None`.
    pub fn find_password(&self, host: &str, port: u16) -> SecretsResult<Option<String>> {
        match self.password(host, port) {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretsError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Succeeds when nothing was stored.
    pub fn delete_password(&self, host: &str, port: u16) -> SecretsResult<()> {
        let key = Self::build_key(host, port);
        match self.entry(&key)?.delete_credential() {
            Ok(()) => {
                tracing::debug!(server = %key, "deleted password from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
