//! Error types for prefkit operations

use crate::value::PreferenceKind;
use thiserror::Error;

/// Settings backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Backend failure: {reason}")]
    Backend { reason: String },

    #[error("Type mismatch for key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: PreferenceKind,
        found: PreferenceKind,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Key and value admissibility errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("No type handler registered for {kind}")]
    UnsupportedType { kind: PreferenceKind },
}

/// Serialization errors for non-primitive values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to encode value: {reason}")]
    Encode { reason: String },

    #[error("Failed to decode value{}: {reason}", key_suffix(.key))]
    Decode { key: Option<String>, reason: String },
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_deref()
        .map(|k| format!(" for '{}'", k))
        .unwrap_or_default()
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Master error type for all prefkit errors.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dispatch failed: {reason}")]
    Dispatch { reason: String },
}

impl PrefsError {
    /// Whether the failure came from key/value validation rather than I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, PrefsError::Validation(_))
    }
}

/// Result type alias for prefkit operations.
pub type PrefsResult<T> = Result<T, PrefsError>;

// =============================================================================
// TESTS
// =============================================================================
