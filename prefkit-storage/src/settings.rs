//! The key-value settings abstraction that every store sits on top of.

use std::collections::BTreeSet;

use prefkit_core::{Preference, PreferenceKind, PreferenceValue, PrefsResult, StorageError};

/// Key-value settings backend.
///
/// Backends only need to move whole [`PreferenceValue`]s in and out; the
/// typed accessors are provided on top of [`Settings::read`] and
/// [`Settings::write`] and enforce that a key is read back under the kind
/// it was stored with.
///
/// Implementations must be safe to call from several threads at once.
/// A write that completes before another starts must be observed by it
/// (last writer wins).
pub trait Settings: Send + Sync {
    /// Read the raw value for a key.
    fn read(&self, key: &str) -> PrefsResult<Option<PreferenceValue>>;

    /// Store a value, replacing whatever was there.
    fn write(&self, key: &str, value: PreferenceValue) -> PrefsResult<()>;

    /// Remove a key. Returns whether it existed.
    fn remove(&self, key: &str) -> PrefsResult<bool>;

    /// All stored keys.
    fn keys(&self) -> PrefsResult<BTreeSet<String>>;

    /// Remove every key.
    fn clear(&self) -> PrefsResult<()>;

    fn contains(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.read(key)?.is_some())
    }

    fn size(&self) -> PrefsResult<usize> {
        Ok(self.keys()?.len())
    }

    /// Kind the key is currently stored under.
    fn kind_of(&self, key: &str) -> PrefsResult<Option<PreferenceKind>> {
        Ok(self.read(key)?.map(|v| v.kind()))
    }

    // === Typed accessors ===

    fn get_int(&self, key: &str) -> PrefsResult<Option<i32>> {
        read_typed(self, key)
    }

    fn get_long(&self, key: &str) -> PrefsResult<Option<i64>> {
        read_typed(self, key)
    }

    fn get_float(&self, key: &str) -> PrefsResult<Option<f32>> {
        read_typed(self, key)
    }

    fn get_double(&self, key: &str) -> PrefsResult<Option<f64>> {
        read_typed(self, key)
    }

    fn get_string(&self, key: &str) -> PrefsResult<Option<String>> {
        read_typed(self, key)
    }

    fn get_bool(&self, key: &str) -> PrefsResult<Option<bool>> {
        read_typed(self, key)
    }

    fn put_int(&self, key: &str, value: i32) -> PrefsResult<()> {
        self.write(key, PreferenceValue::Int(value))
    }

    fn put_long(&self, key: &str, value: i64) -> PrefsResult<()> {
        self.write(key, PreferenceValue::Long(value))
    }

    fn put_float(&self, key: &str, value: f32) -> PrefsResult<()> {
        self.write(key, PreferenceValue::Float(value))
    }

    fn put_double(&self, key: &str, value: f64) -> PrefsResult<()> {
        self.write(key, PreferenceValue::Double(value))
    }

    fn put_string(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.write(key, PreferenceValue::String(value.to_string()))
    }

    fn put_bool(&self, key: &str, value: bool) -> PrefsResult<()> {
        self.write(key, PreferenceValue::Bool(value))
    }
}

/// Read a key and unwrap it as `T`, failing if it is stored under another kind.
pub fn read_typed<T, S>(settings: &S, key: &str) -> PrefsResult<Option<T>>
where
    T: Preference,
    S: Settings + ?Sized,
{
    match settings.read(key)? {
        None => Ok(None),
        Some(value) => {
            let found = value.kind();
            T::from_value(value).map(Some).ok_or_else(|| {
                StorageError::TypeMismatch {
                    key: key.to_string(),
                    expected: T::KIND,
                    found,
                }
                .into()
            })
        }
    }
}
