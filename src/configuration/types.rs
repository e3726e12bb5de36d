use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default database filename in the working directory.
pub const DEFAULT_DB_FILE: &str = "moodcanvas.sqlite3";

/// Default per-project media budget, in MiB.
pub const DEFAULT_PROJECT_LIMIT_MB: u64 = 150;

/// Default store-wide media budget, in MiB.
pub const DEFAULT_GLOBAL_LIMIT_MB: u64 = 600;

/// Store configuration: where the database lives and how much media it may
/// hold before renders start getting reclaimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    pub db_path: PathBuf,
    /// Per-project media budget in MiB
    pub project_limit_mb: u64,
    /// Store-wide media budget in MiB
    pub global_limit_mb: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            project_limit_mb: DEFAULT_PROJECT_LIMIT_MB,
            global_limit_mb: DEFAULT_GLOBAL_LIMIT_MB,
        }
    }
}
