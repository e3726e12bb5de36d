use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum StorageError {
    /// No persistent backend could be opened in this environment.
    Unavailable(String),
    /// The underlying commit failed or was aborted; carries the driver
    /// message verbatim so callers can decide whether to retry.
    TransactionFailed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(e) => write!(f, "Storage unavailable: {}", e),
            StorageError::TransactionFailed(e) => write!(f, "Storage transaction failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}
