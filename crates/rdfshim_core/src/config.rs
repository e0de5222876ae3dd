//! Host-facing configuration records.
//!
//! # Responsibility
//! - Describe logging and statement store setup in serde-friendly shapes.
//!
//! # Invariants
//! - Every field has a usable default except locations, which hosts must
//!   choose explicitly.

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging setup passed to [`crate::init_logging_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`.
    #[serde(default = "default_level_string")]
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: default_level_string(),
            log_dir: log_dir.into(),
        }
    }
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

/// Where a SQLite statement store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreLocation {
    /// Database file, created on first open.
    File(PathBuf),
    /// Private in-memory database, dropped with the store.
    Memory,
}

/// Initialization payload for [`crate::SqliteTripleStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    pub location: StoreLocation,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StoreLocation::File(path.into()).into()
    }

    pub fn memory() -> Self {
        StoreLocation::Memory.into()
    }
}

impl From<StoreLocation> for SqliteStoreConfig {
    fn from(location: StoreLocation) -> Self {
        Self {
            location,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}
