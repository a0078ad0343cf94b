//! Key and value admissibility checks, run before anything reaches a backend.

use prefkit_core::{DataStoreConfig, PreferenceValue, PrefsResult, ValidationError};

/// Decides whether a key or value may be written.
pub trait PreferencesValidator: Send + Sync {
    fn validate_key(&self, key: &str) -> PrefsResult<()>;

    fn validate_value(&self, key: &str, value: &PreferenceValue) -> PrefsResult<()>;
}

/// Default rules:
/// - keys are non-blank, at most `max_key_length` bytes and contain no control characters
/// - string values are at most `max_string_length` bytes
/// - float and double values are finite
#[derive(Debug, Clone)]
pub struct DefaultPreferencesValidator {
    max_key_length: usize,
    max_string_length: usize,
}

impl DefaultPreferencesValidator {
    pub fn new(max_key_length: usize, max_string_length: usize) -> Self {
        Self {
            max_key_length,
            max_string_length,
        }
    }

    pub fn from_config(config: &DataStoreConfig) -> Self {
        Self::new(config.max_key_length, config.max_string_length)
    }
}

impl Default for DefaultPreferencesValidator {
    fn default() -> Self {
        Self::from_config(&DataStoreConfig::default())
    }
}

fn invalid_key(key: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn invalid_value(key: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

impl PreferencesValidator for DefaultPreferencesValidator {
    fn validate_key(&self, key: &str) -> PrefsResult<()> {
        if key.trim().is_empty() {
            return Err(invalid_key(key, "key must not be blank").into());
        }
        if key.len() > self.max_key_length {
            return Err(invalid_key(
                key,
                format!(
                    "key is {} bytes, limit is {}",
                    key.len(),
                    self.max_key_length
                ),
            )
            .into());
        }
        if key.chars().any(char::is_control) {
            return Err(invalid_key(key, "key must not contain control characters").into());
        }
        Ok(())
    }

    fn validate_value(&self, key: &str, value: &PreferenceValue) -> PrefsResult<()> {
        match value {
            PreferenceValue::String(s) if s.len() > self.max_string_length => Err(invalid_value(
                key,
                format!(
                    "string is {} bytes, limit is {}",
                    s.len(),
                    self.max_string_length
                ),
            )
            .into()),
            PreferenceValue::Float(v) if !v.is_finite() => {
                Err(invalid_value(key, "float must be finite").into())
            }
            PreferenceValue::Double(v) if !v.is_finite() => {
                Err(invalid_value(key, "double must be finite").into())
            }
            _ => Ok(()),
        }
    }
}
