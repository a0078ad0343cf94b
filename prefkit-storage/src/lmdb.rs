//! LMDB-backed settings implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a durable,
//! memory-mapped key-value store for preferences.
//!
//! # Value Format
//!
//! Each value is stored as `[kind tag: 1 byte][payload]`. Numeric payloads
//! are little-endian, booleans are a single `0`/`1` byte and strings are raw
//! UTF-8.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `read`, `keys` and `size`
//! - Write transactions for `write`, `remove` and `clear`
//!
//! LMDB serializes write transactions, so concurrent writers to the same
//! key resolve as last-writer-wins.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use prefkit_core::{PreferenceKind, PreferenceValue, PrefsError, PrefsResult, StorageError};

use crate::settings::Settings;

/// Error type for LMDB settings operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbSettingsError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored bytes do not decode to a value.
    #[error("Corrupt value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbSettingsError> for PrefsError {
    fn from(e: LmdbSettingsError) -> Self {
        PrefsError::Storage(StorageError::Backend {
            reason: e.to_string(),
        })
    }
}

fn txn_err(e: heed::Error) -> LmdbSettingsError {
    LmdbSettingsError::Transaction(e.to_string())
}

/// Durable settings stored in an LMDB environment.
///
/// # Example
///
/// ```ignore
/// use prefkit_storage::{LmdbSettings, Settings};
///
/// let settings = LmdbSettings::open("/tmp/prefs", 16)?;
/// settings.put_bool("onboarding_done", true)?;
/// assert_eq!(settings.get_bool("onboarding_done")?, Some(true));
/// ```
pub struct LmdbSettings {
    env: Env,
    db: Database<Str, Bytes>,
    path: PathBuf,
}

impl LmdbSettings {
    /// Open (or create) an LMDB settings store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbSettingsError> {
        let map_size = max_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            LmdbSettingsError::EnvOpen(format!("map size of {max_size_mb} MB overflows"))
        })?;
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbSettingsError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbSettingsError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.as_ref().display(), max_size_mb, "Opened LMDB settings");

        Ok(Self {
            env,
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Directory backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encode a value as `[tag][payload]`.
pub(crate) fn encode_value(value: &PreferenceValue) -> Vec<u8> {
    let mut out = vec![value.kind().tag()];
    match value {
        PreferenceValue::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
        PreferenceValue::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
        PreferenceValue::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        PreferenceValue::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        PreferenceValue::String(v) => out.extend_from_slice(v.as_bytes()),
        PreferenceValue::Bool(v) => out.push(u8::from(*v)),
    }
    out
}

/// Decode bytes produced by [`encode_value`].
pub(crate) fn decode_value(key: &str, bytes: &[u8]) -> Result<PreferenceValue, LmdbSettingsError> {
    let corrupt = |reason: &str| LmdbSettingsError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let (&tag, payload) = bytes.split_first().ok_or_else(|| corrupt("empty value"))?;
    let kind = PreferenceKind::from_tag(tag).ok_or_else(|| corrupt("unknown kind tag"))?;

    let value = match kind {
        PreferenceKind::Int => PreferenceValue::Int(i32::from_le_bytes(
            payload.try_into().map_err(|_| corrupt("int payload must be 4 bytes"))?,
        )),
        PreferenceKind::Long => PreferenceValue::Long(i64::from_le_bytes(
            payload.try_into().map_err(|_| corrupt("long payload must be 8 bytes"))?,
        )),
        PreferenceKind::Float => PreferenceValue::Float(f32::from_le_bytes(
            payload.try_into().map_err(|_| corrupt("float payload must be 4 bytes"))?,
        )),
        PreferenceKind::Double => PreferenceValue::Double(f64::from_le_bytes(
            payload.try_into().map_err(|_| corrupt("double payload must be 8 bytes"))?,
        )),
        PreferenceKind::String => PreferenceValue::String(
            std::str::from_utf8(payload)
                .map_err(|_| corrupt("string payload is not UTF-8"))?
                .to_string(),
        ),
        PreferenceKind::Bool => match payload {
            [0] => PreferenceValue::Bool(false),
            [1] => PreferenceValue::Bool(true),
            _ => return Err(corrupt("bool payload must be a single 0/1 byte")),
        },
    };

    Ok(value)
}

impl Settings for LmdbSettings {
    fn read(&self, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        match self.db.get(&rtxn, key).map_err(txn_err)? {
            Some(bytes) => Ok(Some(decode_value(key, bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: PreferenceValue) -> PrefsResult<()> {
        let bytes = encode_value(&value);

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.put(&mut wtxn, key, &bytes).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefsResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self.db.delete(&mut wtxn, key).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    fn keys(&self) -> PrefsResult<BTreeSet<String>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let mut keys = BTreeSet::new();
        for entry in self.db.iter(&rtxn).map_err(txn_err)? {
            let (key, _) = entry.map_err(txn_err)?;
            keys.insert(key.to_string());
        }
        Ok(keys)
    }

    fn clear(&self) -> PrefsResult<()> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.clear(&mut wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    fn contains(&self, key: &str) -> PrefsResult<bool> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        Ok(self.db.get(&rtxn, key).map_err(txn_err)?.is_some())
    }

    fn size(&self) -> PrefsResult<usize> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let len = self.db.len(&rtxn).map_err(txn_err)?;
        Ok(len as usize)
    }
}
