// src/config.rs
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::domain::error::DomainError;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_POOL_SIZE: u32 = 15;
pub const DB_URL_ENV: &str = "BMSTORE_DB_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot expand path '{0}': {1}")]
    Expand(String, String),
}

/// How a store is opened. Passed explicitly to `open_with`; there is no
/// process wide default.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Create the file when it does not exist yet (parent directory must exist)
    #[builder(default = "true")]
    pub create_if_missing: bool,

    /// How long an operation waits on a locked database before `StorageBusy`
    #[builder(default = "Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS)")]
    pub busy_timeout: Duration,

    /// Maximum number of pooled connections
    #[builder(default = "DEFAULT_POOL_SIZE")]
    pub pool_size: u32,

    /// Copy a populated database file aside before migrating its schema
    #[builder(default = "true")]
    pub backup_before_migration: bool,
}

impl StoreConfig {
    /// Configuration with defaults for everything but the path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            pool_size: DEFAULT_POOL_SIZE,
            backup_before_migration: true,
        }
    }
}

impl From<StoreConfigBuilderError> for DomainError {
    fn from(e: StoreConfigBuilderError) -> Self {
        DomainError::StorageUnavailable(format!("Invalid store configuration: {}", e))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_url: String,

    /// Lock wait in milliseconds before an operation reports the store as busy
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_db_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config/bmstore/bookmarks.db")
        .to_string_lossy()
        .to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_url: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

impl Settings {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            pool_size: self.pool_size,
            ..StoreConfig::new(&self.db_url)
        }
    }
}

fn user_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config/bmstore/config.toml"))
}

fn read_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<Settings>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings: defaults, then the config file, then the environment.
///
/// An explicitly given file must exist and parse; the user config file is
/// only read when present.
#[instrument(level = "debug")]
pub fn load_settings(config_file: Option<&Path>) -> Result<Settings, ConfigError> {
    trace!("Loading settings");

    let mut settings = match config_file {
        Some(path) => read_settings_file(path)?,
        None => match user_config_file().filter(|p| p.exists()) {
            Some(path) => {
                trace!("Loading config from: {:?}", path);
                read_settings_file(&path)?
            }
            None => Settings::default(),
        },
    };

    if let Ok(db_url) = std::env::var(DB_URL_ENV) {
        trace!("Using {} from environment: {}", DB_URL_ENV, db_url);
        settings.db_url = db_url;
    }

    settings.db_url = shellexpand::full(&settings.db_url)
        .map_err(|e| ConfigError::Expand(settings.db_url.clone(), e.to_string()))?
        .to_string();

    debug!("Settings loaded: {:?}", settings);
    Ok(settings)
}

pub fn generate_default_config() -> String {
    toml::to_string_pretty(&Settings::default())
        .unwrap_or_else(|_| "# Error generating default configuration".to_string())
}
