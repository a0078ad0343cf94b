//! Serialization strategies for values that are not primitives.
//!
//! Structured values are converted to a `serde_json::Value` first and the
//! strategy decides how that tree becomes the stored string. Keeping the
//! trait on `serde_json::Value` keeps it object-safe, so stores can hold a
//! `dyn SerializationStrategy`.

use prefkit_core::{PrefsError, PrefsResult, SerializationError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Turns structured values into strings and back.
pub trait SerializationStrategy: Send + Sync {
    /// Encode a JSON tree into its stored form.
    fn encode(&self, value: &serde_json::Value) -> PrefsResult<String>;

    /// Decode a stored string back into a JSON tree.
    fn decode(&self, raw: &str) -> PrefsResult<serde_json::Value>;
}

/// Plain JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializationStrategy {
    pretty: bool,
}

impl JsonSerializationStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented JSON. Handy when the backing store is inspected by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SerializationStrategy for JsonSerializationStrategy {
    fn encode(&self, value: &serde_json::Value) -> PrefsResult<String> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.map_err(|e| {
            SerializationError::Encode {
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn decode(&self, raw: &str) -> PrefsResult<serde_json::Value> {
        serde_json::from_str(raw).map_err(|e| {
            SerializationError::Decode {
                key: None,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// Serialize any `T` through a strategy.
pub fn serialize<T>(strategy: &dyn SerializationStrategy, value: &T) -> PrefsResult<String>
where
    T: Serialize + ?Sized,
{
    let tree = serde_json::to_value(value).map_err(|e| SerializationError::Encode {
        reason: e.to_string(),
    })?;
    strategy.encode(&tree)
}

/// Deserialize a `T` previously written with [`serialize`].
///
/// `key` is only used to make decode errors point at the offending entry.
pub fn deserialize<T>(strategy: &dyn SerializationStrategy, key: &str, raw: &str) -> PrefsResult<T>
where
    T: DeserializeOwned,
{
    let with_key = |reason: String| SerializationError::Decode {
        key: Some(key.to_string()),
        reason,
    };

    let tree = match strategy.decode(raw) {
        Ok(tree) => tree,
        Err(PrefsError::Serialization(SerializationError::Decode { reason, .. })) => {
            return Err(with_key(reason).into())
        }
        Err(other) => return Err(other),
    };
    serde_json::from_value(tree).map_err(|e| with_key(e.to_string()).into())
}
