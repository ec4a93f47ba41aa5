//! Store configuration.
//!
//! Values come from serde (embedding hosts) or `TALENT_*` environment
//! variables; anything unset falls back to the defaults below.

use crate::db::{open_db_in_memory, open_db_with_timeout, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TALENT_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "TALENT_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "TALENT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TALENT_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for opening the store and its process logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_level")]
    pub log_level: String,
    /// Absolute directory for log files; `None` leaves logging to the host.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_level() -> String {
    default_log_level().to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            log_level: default_level(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads `TALENT_*` variables from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = non_blank(lookup(ENV_BUSY_TIMEOUT_MS)) {
            config.busy_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|err| ConfigError::InvalidValue {
                        key: ENV_BUSY_TIMEOUT_MS,
                        message: format!("`{raw}` is not a number of milliseconds: {err}"),
                    })?;
        }
        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = normalize_level(&level)
                .map_err(|message| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    message,
                })?
                .to_string();
        }
        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Starts file logging when `log_dir` is configured.
///
/// # Errors
/// Returns the logging bootstrap message on failure.
pub fn init_configured_logging(config: &StoreConfig) -> Result<(), String> {
    match &config.log_dir {
        Some(dir) => init_logging(&config.log_level, &dir.to_string_lossy()),
        None => Ok(()),
    }
}

/// Opens the configured database with the schema applied.
///
/// # Errors
/// Returns `DbError` when the database cannot be opened or migrated.
pub fn open_store(config: &StoreConfig) -> DbResult<Connection> {
    match &config.db_path {
        Some(path) => open_db_with_timeout(path, config.busy_timeout()),
        None => open_db_in_memory(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
