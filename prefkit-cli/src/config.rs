//! Configuration loading for the prefkit CLI.
//!
//! `store_path` and `map_size_mb` are required. The `[datastore]` table is
//! optional and falls back to library defaults field by field.

use prefkit_core::DataStoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `--config` is not given.
pub const CONFIG_ENV: &str = "PREFKIT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Directory holding the LMDB environment. Created if missing.
    pub store_path: PathBuf,
    /// LMDB map size in MiB.
    pub map_size_mb: usize,
    #[serde(default)]
    pub datastore: DataStoreConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or PREFKIT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CliConfig {
    /// Load from `explicit`, else from `PREFKIT_CONFIG`.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = resolve_path(explicit, std::env::var(CONFIG_ENV).ok())?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CliConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.map_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "map_size_mb",
                reason: "must be > 0".to_string(),
            });
        }
        self.datastore
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "datastore",
                reason: e.to_string(),
            })
    }
}

fn resolve_path(explicit: Option<PathBuf>, env: Option<String>) -> Result<PathBuf, ConfigError> {
    explicit
        .or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .ok_or(ConfigError::MissingConfigPath)
}
