//! prefkit Test Utilities
//!
//! Shared test infrastructure for the prefkit workspace:
//! - Proptest generators for keys and values
//! - Fixtures for in-memory stores
//! - Mock backends that fail or count calls

pub use prefkit_core::{
    ChangeEvent, ChangeKind, DataStoreConfig, DispatchMode, PreferenceKind, PreferenceValue,
    PrefsError, PrefsResult, StorageError,
};
pub use prefkit_datastore::{PreferencesRepository, ReactivePreferencesDataStore};
pub use prefkit_storage::{MemorySettings, Settings};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// MOCK BACKENDS
// ============================================================================

/// Backend whose every call fails with [`StorageError::Backend`].
#[derive(Debug, Clone, Default)]
pub struct FailingSettings {
    reason: String,
}

impl FailingSettings {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> PrefsResult<T> {
        Err(StorageError::Backend {
            reason: self.reason.clone(),
        }
        .into())
    }
}

impl Settings for FailingSettings {
    fn read(&self, _key: &str) -> PrefsResult<Option<PreferenceValue>> {
        self.fail()
    }

    fn write(&self, _key: &str, _value: PreferenceValue) -> PrefsResult<()> {
        self.fail()
    }

    fn remove(&self, _key: &str) -> PrefsResult<bool> {
        self.fail()
    }

    fn keys(&self) -> PrefsResult<BTreeSet<String>> {
        self.fail()
    }

    fn clear(&self) -> PrefsResult<()> {
        self.fail()
    }
}

/// In-memory backend that counts the calls reaching it.
#[derive(Debug, Default)]
pub struct CountingSettings {
    inner: MemorySettings,
    calls: Arc<AtomicUsize>,
}

impl CountingSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared call counter; stays readable after the backend moves into a store.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Settings for CountingSettings {
    fn read(&self, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        self.hit();
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: PreferenceValue) -> PrefsResult<()> {
        self.hit();
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> PrefsResult<bool> {
        self.hit();
        self.inner.remove(key)
    }

    fn keys(&self) -> PrefsResult<BTreeSet<String>> {
        self.hit();
        self.inner.keys()
    }

    fn clear(&self) -> PrefsResult<()> {
        self.hit();
        self.inner.clear()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Keys the default validator accepts.
    pub fn arb_key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_.-]{0,31}"
    }

    /// Keys the default validator rejects.
    pub fn arb_invalid_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            " {1,4}",
            "[a-z]{1,4}[\n\t\r][a-z]{0,4}",
            "[a-z]{257,300}",
        ]
    }

    pub fn arb_kind() -> impl Strategy<Value = PreferenceKind> {
        prop::sample::select(PreferenceKind::ALL.to_vec())
    }

    /// Any value of the given kind that the default validator accepts.
    pub fn arb_value_of(kind: PreferenceKind) -> BoxedStrategy<PreferenceValue> {
        match kind {
            PreferenceKind::Int => any::<i32>().prop_map(PreferenceValue::Int).boxed(),
            PreferenceKind::Long => any::<i64>().prop_map(PreferenceValue::Long).boxed(),
            PreferenceKind::Float => prop::num::f32::NORMAL
                .prop_map(PreferenceValue::Float)
                .boxed(),
            PreferenceKind::Double => prop::num::f64::NORMAL
                .prop_map(PreferenceValue::Double)
                .boxed(),
            PreferenceKind::String => ".{0,64}".prop_map(PreferenceValue::String).boxed(),
            PreferenceKind::Bool => any::<bool>().prop_map(PreferenceValue::Bool).boxed(),
        }
    }

    /// Any valid value of any kind.
    pub fn arb_value() -> impl Strategy<Value = PreferenceValue> {
        arb_kind().prop_flat_map(arb_value_of)
    }

    /// Values the default validator rejects.
    pub fn arb_non_finite() -> impl Strategy<Value = PreferenceValue> {
        prop_oneof![
            Just(PreferenceValue::Float(f32::NAN)),
            Just(PreferenceValue::Float(f32::INFINITY)),
            Just(PreferenceValue::Double(f64::NEG_INFINITY)),
            Just(PreferenceValue::Double(f64::NAN)),
        ]
    }

    /// A small map of distinct keys to values.
    pub fn arb_entries(max: usize) -> impl Strategy<Value = Vec<(String, PreferenceValue)>> {
        prop::collection::btree_map(arb_key(), arb_value(), 0..=max)
            .prop_map(|entries| entries.into_iter().collect())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    /// Defaults, with backend calls made on the calling task.
    pub fn inline_config() -> DataStoreConfig {
        DataStoreConfig::default().with_dispatcher(DispatchMode::Inline)
    }

    /// In-memory store with an inline dispatcher. Usable from any runtime
    /// flavor, including the single-threaded `#[tokio::test]` default.
    pub fn memory_store() -> ReactivePreferencesDataStore {
        store_over(MemorySettings::new(), inline_config())
    }

    /// Store over an arbitrary backend.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    pub fn store_over(
        settings: impl Settings + 'static,
        config: DataStoreConfig,
    ) -> ReactivePreferencesDataStore {
        match ReactivePreferencesDataStore::new(settings, config) {
            Ok(store) => store,
            Err(e) => panic!("test store config rejected: {e}"),
        }
    }

    pub fn memory_repository() -> PreferencesRepository {
        PreferencesRepository::new(memory_store())
    }

    /// A store pre-populated with one value of every kind.
    pub fn sample_entries() -> Vec<(&'static str, PreferenceValue)> {
        vec![
            ("app.launches", PreferenceValue::Int(12)),
            ("app.installed_at", PreferenceValue::Long(1_700_000_000_000)),
            ("ui.scale", PreferenceValue::Float(1.25)),
            ("ui.ratio", PreferenceValue::Double(0.618)),
            ("ui.theme", PreferenceValue::String("dark".to_string())),
            ("ui.onboarded", PreferenceValue::Bool(true)),
        ]
    }

    pub fn populated_settings() -> MemorySettings {
        MemorySettings::with_entries(
            sample_entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v)),
        )
    }
}
