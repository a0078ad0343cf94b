//! In-memory settings backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use prefkit_core::{PreferenceValue, PrefsResult, StorageError};

use crate::settings::Settings;

/// Settings backend holding everything in a locked hash map.
///
/// Nothing survives the process. Used by tests and by applications that
/// only need session-scoped preferences.
#[derive(Debug, Default)]
pub struct MemorySettings {
    entries: RwLock<HashMap<String, PreferenceValue>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with existing entries.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PreferenceValue)>,
        K: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl Settings for MemorySettings {
    fn read(&self, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: PreferenceValue) -> PrefsResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefsResult<bool> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> PrefsResult<BTreeSet<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn clear(&self) -> PrefsResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.clear();
        Ok(())
    }

    fn contains(&self, key: &str) -> PrefsResult<bool> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.contains_key(key))
    }

    fn size(&self) -> PrefsResult<usize> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefkit_core::{PreferenceKind, PrefsError};

    #[test]
    fn test_put_and_get_each_kind() {
        let settings = MemorySettings::new();
        settings.put_int("i", 1).unwrap();
        settings.put_long("l", 2).unwrap();
        settings.put_float("f", 3.5).unwrap();
        settings.put_double("d", 4.25).unwrap();
        settings.put_string("s", "five").unwrap();
        settings.put_bool("b", true).unwrap();

        assert_eq!(settings.get_int("i").unwrap(), Some(1));
        assert_eq!(settings.get_long("l").unwrap(), Some(2));
        assert_eq!(settings.get_float("f").unwrap(), Some(3.5));
        assert_eq!(settings.get_double("d").unwrap(), Some(4.25));
        assert_eq!(settings.get_string("s").unwrap(), Some("five".to_string()));
        assert_eq!(settings.get_bool("b").unwrap(), Some(true));
        assert_eq!(settings.size().unwrap(), 6);
    }

    #[test]
    fn test_get_missing_is_none() {
        let settings = MemorySettings::new();
        assert_eq!(settings.get_int("missing").unwrap(), None);
        assert!(!settings.contains("missing").unwrap());
    }

    #[test]
    fn test_get_wrong_kind_is_type_mismatch() {
        let settings = MemorySettings::new();
        settings.put_string("volume", "loud").unwrap();

        let err = settings.get_int("volume").unwrap_err();
        match err {
            PrefsError::Storage(StorageError::TypeMismatch {
                key,
                expected,
                found,
            }) => {
                assert_eq!(key, "volume");
                assert_eq!(expected, PreferenceKind::Int);
                assert_eq!(found, PreferenceKind::String);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overwrite_changes_kind() {
        let settings = MemorySettings::new();
        settings.put_int("k", 1).unwrap();
        settings.put_bool("k", false).unwrap();
        assert_eq!(settings.kind_of("k").unwrap(), Some(PreferenceKind::Bool));
        assert_eq!(settings.size().unwrap(), 1);
    }

    #[test]
    fn test_remove_reports_existence() {
        let settings = MemorySettings::with_entries([("a", PreferenceValue::Int(1))]);
        assert!(settings.remove("a").unwrap());
        assert!(!settings.remove("a").unwrap());
    }

    #[test]
    fn test_clear_empties_keys() {
        let settings = MemorySettings::with_entries([
            ("a", PreferenceValue::Int(1)),
            ("b", PreferenceValue::Bool(true)),
        ]);
        settings.clear().unwrap();
        assert!(settings.keys().unwrap().is_empty());
    }
}
