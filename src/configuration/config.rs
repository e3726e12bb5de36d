use super::types::StoreConfig;
use crate::error_handling::types::ConfigError;
use std::path::Path;

impl StoreConfig {
    /// Parses a `StoreConfig` from a TOML document and validates it.
    ///
    /// Missing fields fall back to their defaults, so an empty document is a
    /// valid configuration.
    pub fn from_toml_str(input: &str) -> Result<StoreConfig, ConfigError> {
        let config: StoreConfig =
            toml::from_str(input).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<StoreConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Checks value ranges. Budgets of zero would make every write trigger a
    /// full eviction scan, so they are rejected outright.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_limit_mb == 0 {
            return Err(ConfigError::NotInRange(
                "project_limit_mb must be greater than 0".to_string(),
            ));
        }
        if self.global_limit_mb == 0 {
            return Err(ConfigError::NotInRange(
                "global_limit_mb must be greater than 0".to_string(),
            ));
        }
        if self.global_limit_mb < self.project_limit_mb {
            return Err(ConfigError::NotInRange(
                "global_limit_mb must be at least project_limit_mb".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = StoreConfig::from_toml_str(
            r#"
            db_path = "/var/lib/moodcanvas/store.sqlite3"
            project_limit_mb = 64
            global_limit_mb = 256
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/moodcanvas/store.sqlite3"));
        assert_eq!(config.project_limit_mb, 64);
        assert_eq!(config.global_limit_mb, 256);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = StoreConfig::from_toml_str("project_limit_mb = 0").unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
    }

    #[test]
    fn test_global_below_project_rejected() {
        let err = StoreConfig::from_toml_str(
            "project_limit_mb = 100\nglobal_limit_mb = 50",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = StoreConfig::from_toml_str("db_path = [").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }
}
