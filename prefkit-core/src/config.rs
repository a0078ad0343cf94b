//! Configuration types

use crate::error::{ConfigError, PrefsError, PrefsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where backend calls run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// On the calling task. Suitable for in-memory backends and tests.
    Inline,
    /// On the runtime's blocking pool.
    #[default]
    Background,
}

/// Data store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataStoreConfig {
    /// Maximum number of values held in the read cache. Zero disables caching.
    pub cache_capacity: usize,
    /// Number of change events buffered per subscriber before it lags.
    pub change_buffer: usize,
    /// Maximum key length in bytes.
    pub max_key_length: usize,
    /// Maximum string value length in bytes.
    pub max_string_length: usize,
    pub dispatcher: DispatchMode,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 200,
            change_buffer: 64,
            max_key_length: 256,
            max_string_length: 1024 * 1024, // 1 MiB
            dispatcher: DispatchMode::Background,
        }
    }
}

impl DataStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_change_buffer(mut self, buffer: usize) -> Self {
        self.change_buffer = buffer;
        self
    }

    pub fn with_max_key_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    pub fn with_max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = max;
        self
    }

    pub fn with_dispatcher(mut self, mode: DispatchMode) -> Self {
        self.dispatcher = mode;
        self
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> PrefsResult<Self> {
        let config: DataStoreConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_path(path: &Path) -> PrefsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&contents)
    }

    /// Validate that all values are usable.
    pub fn validate(&self) -> PrefsResult<()> {
        if self.change_buffer == 0 {
            return Err(invalid(
                "change_buffer",
                self.change_buffer,
                "change_buffer must be greater than 0",
            ));
        }

        if self.max_key_length == 0 {
            return Err(invalid(
                "max_key_length",
                self.max_key_length,
                "max_key_length must be greater than 0",
            ));
        }

        if self.max_string_length == 0 {
            return Err(invalid(
                "max_string_length",
                self.max_string_length,
                "max_string_length must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: usize, reason: &str) -> PrefsError {
    PrefsError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DataStoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DataStoreConfig::new()
            .with_cache_capacity(8)
            .with_change_buffer(4)
            .with_max_key_length(32)
            .with_max_string_length(128)
            .with_dispatcher(DispatchMode::Inline);

        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.change_buffer, 4);
        assert_eq!(config.max_key_length, 32);
        assert_eq!(config.max_string_length, 128);
        assert_eq!(config.dispatcher, DispatchMode::Inline);
    }

    #[test]
    fn test_zero_change_buffer_rejected() {
        let err = DataStoreConfig::new()
            .with_change_buffer(0)
            .validate()
            .unwrap_err();
        assert!(format!("{}", err).contains("change_buffer"));
    }

    #[test]
    fn test_zero_cache_capacity_allowed() {
        assert!(DataStoreConfig::new()
            .with_cache_capacity(0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DataStoreConfig::from_toml_str(
            r#"
            cache_capacity = 16
            dispatcher = "inline"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.dispatcher, DispatchMode::Inline);
        assert_eq!(config.change_buffer, 64);
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        let err = DataStoreConfig::from_toml_str("cache_size = 3").unwrap_err();
        assert!(matches!(err, PrefsError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_toml_runs_validation() {
        let err = DataStoreConfig::from_toml_str("max_key_length = 0").unwrap_err();
        assert!(matches!(
            err,
            PrefsError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "change_buffer = 5").unwrap();
        let config = DataStoreConfig::from_path(file.path()).unwrap();
        assert_eq!(config.change_buffer, 5);
    }

    #[test]
    fn test_from_missing_path() {
        let err = DataStoreConfig::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PrefsError::Config(ConfigError::Io(_))));
    }
}
