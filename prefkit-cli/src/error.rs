//! Error types for the CLI.

use crate::config::ConfigError;
use prefkit_core::{PreferenceKind, PrefsError};
use prefkit_storage::LmdbSettingsError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] PrefsError),
    #[error(transparent)]
    Lmdb(#[from] LmdbSettingsError),
    #[error("'{raw}' is not a valid {kind}")]
    InvalidValue { kind: PreferenceKind, raw: String },
}
