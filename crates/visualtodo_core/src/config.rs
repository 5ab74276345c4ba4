//! Runtime configuration for remote endpoints and local storage.
//!
//! # Responsibility
//! - Read connection settings from the process environment (optionally
//!   seeded from a `.env` file).
//! - Validate settings before any client is built.
//!
//! # Invariants
//! - `server_url` never ends with `/`; endpoint paths are appended to it.
//! - `request_timeout` is non-zero.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SERVER_URL: &str = "VISUALTODO_SERVER_URL";
pub const ENV_ANON_KEY: &str = "VISUALTODO_ANON_KEY";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "VISUALTODO_REQUEST_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "VISUALTODO_DATA_DIR";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const LOCAL_DB_FILE_NAME: &str = "visualtodo.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid { key, message } => write!(f, "invalid setting `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Connection settings for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the function host, e.g. `https://host/functions/v1/todo`.
    pub server_url: String,
    /// Shared anonymous bearer credential.
    pub anon_key: String,
    pub request_timeout: Duration,
    /// Directory of the local fallback database; in-memory when `None`.
    pub data_dir: Option<PathBuf>,
}

impl SyncConfig {
    pub fn new(server_url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            server_url: normalize_server_url(server_url)?,
            anon_key: normalize_anon_key(anon_key)?,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: None,
        })
    }

    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup(ENV_SERVER_URL).ok_or(ConfigError::Missing(ENV_SERVER_URL))?;
        let anon_key = lookup(ENV_ANON_KEY).ok_or(ConfigError::Missing(ENV_ANON_KEY))?;
        let mut config = Self::new(&server_url, &anon_key)?;

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::Invalid {
                    key: ENV_REQUEST_TIMEOUT_SECS,
                    message: err.to_string(),
                })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_REQUEST_TIMEOUT_SECS,
                    message: "timeout must be at least one second".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        config.data_dir = lookup(ENV_DATA_DIR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Location of the SQLite fallback file, when a data dir is configured.
    pub fn local_db_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(LOCAL_DB_FILE_NAME))
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.server_url, path.trim_start_matches('/'))
    }
}

fn normalize_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(ENV_SERVER_URL));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            key: ENV_SERVER_URL,
            message: format!("expected an http(s) URL, got `{trimmed}`"),
        });
    }
    Ok(trimmed.to_string())
}

fn normalize_anon_key(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(ENV_ANON_KEY));
    }
    Ok(trimmed.to_string())
}
