//! Store and application configuration.
//!
//! # Responsibility
//! - Carry the storage base directory as an explicit value handed to every
//!   store, instead of process-global mutable state.
//! - Resolve application settings from environment variables.
//!
//! # Invariants
//! - `StoreConfig` construction performs no I/O; only `configure` touches
//!   the filesystem.
//! - `AppConfig` values are validated once at load time.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::article_repo::ARTICLE_COLLECTION;
use crate::store::is_valid_record_id;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Base directory used when none is configured.
pub const DEFAULT_BASE_PATH: &str = "./storage";
/// Collection used by the article repository when none is configured.
pub const DEFAULT_COLLECTION: &str = ARTICLE_COLLECTION;

pub const ENV_STORAGE_DIR: &str = "PAPERBOX_STORAGE_DIR";
pub const ENV_COLLECTION: &str = "PAPERBOX_COLLECTION";
pub const ENV_LOG_LEVEL: &str = "PAPERBOX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PAPERBOX_LOG_DIR";

/// Root directory shared by every collection of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    base_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PATH)
    }
}

impl StoreConfig {
    /// Creates a configuration without touching the filesystem.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a configuration and makes sure the base directory exists.
    ///
    /// # Errors
    /// - Propagates the raw I/O error when the directory cannot be created.
    pub fn configure(base_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let config = Self::new(base_path);
        std::fs::create_dir_all(&config.base_path)?;
        Ok(config)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding the records of `collection`.
    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.base_path.join(collection)
    }
}

/// Configuration error raised while resolving `AppConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStorageDir,
    InvalidCollection(String),
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorageDir => write!(f, "{ENV_STORAGE_DIR} cannot be empty"),
            Self::InvalidCollection(name) => write!(
                f,
                "invalid collection name `{name}`; expected ASCII letters, digits, `-` or `_`"
            ),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(dir) => {
                write!(f, "{ENV_LOG_DIR} must be an absolute path, got `{dir}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for a process hosting Paperbox repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub collection: String,
    pub log_level: &'static str,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            collection: DEFAULT_COLLECTION.to_string(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset, except for the storage dir.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            let dir = dir.trim();
            if dir.is_empty() {
                return Err(ConfigError::EmptyStorageDir);
            }
            config.store = StoreConfig::new(dir);
        }

        if let Some(collection) = non_blank(lookup(ENV_COLLECTION)) {
            if !is_valid_record_id(&collection) {
                return Err(ConfigError::InvalidCollection(collection));
            }
            config.collection = collection;
        }

        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }

        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
