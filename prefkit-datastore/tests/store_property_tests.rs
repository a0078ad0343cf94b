//! Property-Based Tests for the Reactive Preferences Data Store
//!
//! **Property 1: Round Trip**
//! For any valid key and value, a `put` followed by a `get` of the same
//! kind returns the value, from the cache and from the backend alike.
//!
//! **Property 2: Rejection Without Side Effects**
//! Invalid keys and non-finite floats are rejected before any backend call.
//!
//! **Property 3: Clear Empties Everything**
//! After `clear_all`, no key remains and the cache is empty.
//!
//! **Property 4: Distinct Observation**
//! N identical writes after the first produce exactly one emission.

use prefkit_datastore::{PreferenceValue, PrefsError, ReactivePreferencesDataStore};
use prefkit_test_utils::fixtures::{inline_config, memory_store, store_over};
use prefkit_test_utils::generators::{
    arb_entries, arb_invalid_key, arb_key, arb_non_finite, arb_value,
};
use prefkit_test_utils::{CountingSettings, FailingSettings, StorageError};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::timeout;
use tokio_stream::StreamExt;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn runtime() -> Result<tokio::runtime::Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn fail(e: PrefsError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

async fn read_back(
    store: &ReactivePreferencesDataStore,
    key: &str,
    like: &PreferenceValue,
) -> Result<PreferenceValue, PrefsError> {
    let missing = || PrefsError::from(StorageError::Backend {
        reason: format!("{key} vanished"),
    });
    Ok(match like {
        PreferenceValue::Int(_) => PreferenceValue::Int(store.get_optional(key).await?.ok_or_else(missing)?),
        PreferenceValue::Long(_) => PreferenceValue::Long(store.get_optional(key).await?.ok_or_else(missing)?),
        PreferenceValue::Float(_) => PreferenceValue::Float(store.get_optional(key).await?.ok_or_else(missing)?),
        PreferenceValue::Double(_) => PreferenceValue::Double(store.get_optional(key).await?.ok_or_else(missing)?),
        PreferenceValue::String(_) => PreferenceValue::String(store.get_optional(key).await?.ok_or_else(missing)?),
        PreferenceValue::Bool(_) => PreferenceValue::Bool(store.get_optional(key).await?.ok_or_else(missing)?),
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// **Property 1: Round Trip**
    #[test]
    fn prop_put_then_get_round_trips(key in arb_key(), value in arb_value()) {
        let rt = runtime()?;
        rt.block_on(async {
            let store = memory_store();
            store.put_value(&key, value.clone()).await.map_err(fail)?;

            let cached = read_back(&store, &key, &value).await.map_err(fail)?;
            prop_assert_eq!(&cached, &value);

            store.invalidate_all_cache();
            let stored = read_back(&store, &key, &value).await.map_err(fail)?;
            prop_assert_eq!(&stored, &value);

            let raw = store.get_value(&key).await.map_err(fail)?;
            prop_assert_eq!(raw, Some(value));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Property 2: Rejection Without Side Effects** (keys)
    #[test]
    fn prop_invalid_keys_never_reach_backend(key in arb_invalid_key(), value in arb_value()) {
        let rt = runtime()?;
        rt.block_on(async {
            let settings = CountingSettings::new();
            let calls = settings.counter();
            let store = store_over(settings, inline_config());

            let err = store.put_value(&key, value).await;
            prop_assert!(matches!(err, Err(ref e) if e.is_validation()));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Property 2: Rejection Without Side Effects** (values)
    #[test]
    fn prop_non_finite_values_never_reach_backend(key in arb_key(), value in arb_non_finite()) {
        let rt = runtime()?;
        rt.block_on(async {
            let settings = CountingSettings::new();
            let calls = settings.counter();
            let store = store_over(settings, inline_config());

            let err = store.put_value(&key, value).await;
            prop_assert!(matches!(err, Err(ref e) if e.is_validation()));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Property 3: Clear Empties Everything**
    #[test]
    fn prop_clear_all_empties_store(entries in arb_entries(16)) {
        let rt = runtime()?;
        rt.block_on(async {
            let store = memory_store();
            for (key, value) in &entries {
                store.put_value(key, value.clone()).await.map_err(fail)?;
            }
            prop_assert_eq!(store.len().await.map_err(fail)?, entries.len());

            store.clear_all().await.map_err(fail)?;
            prop_assert!(store.keys().await.map_err(fail)?.is_empty());
            prop_assert_eq!(store.cache_size(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Property 4: Distinct Observation**
    #[test]
    fn prop_repeated_writes_emit_once(key in arb_key(), value in any::<i64>(), repeats in 1usize..10) {
        let rt = runtime()?;
        rt.block_on(async {
            let store = memory_store();
            store.put(&key, value).await.map_err(fail)?;

            let stream = store.observe(&key, 0i64).map_err(fail)?;
            tokio::pin!(stream);
            let first = stream.next().await;
            prop_assert!(matches!(first, Some(Ok(v)) if v == value));

            for _ in 0..repeats {
                store.put(&key, value).await.map_err(fail)?;
            }
            let quiet = timeout(Duration::from_millis(20), stream.next()).await;
            prop_assert!(quiet.is_err());
            Ok::<(), TestCaseError>(())
        })?;
    }
}

#[tokio::test]
async fn failing_backend_errors_propagate() {
    let store = store_over(FailingSettings::new("unreachable"), inline_config());

    let err = store.put("k", 1i32).await.unwrap_err();
    assert!(matches!(err, PrefsError::Storage(StorageError::Backend { .. })));
    assert!(!err.is_validation());

    assert!(store.get("k", 0i32).await.is_err());
    assert!(store.keys().await.is_err());
    assert!(store.clear_all().await.is_err());
}

#[tokio::test]
async fn failing_backend_surfaces_in_observation() {
    let store = store_over(FailingSettings::new("unreachable"), inline_config());
    let stream = store.observe("k", 0i32).unwrap();
    tokio::pin!(stream);
    assert!(stream.next().await.unwrap().is_err());
}

#[tokio::test]
async fn populated_backend_is_readable_without_writes() {
    let store = store_over(
        prefkit_test_utils::fixtures::populated_settings(),
        inline_config(),
    );
    assert_eq!(store.get("app.launches", 0i32).await.unwrap(), 12);
    assert_eq!(store.get("ui.theme", String::new()).await.unwrap(), "dark");
    assert_eq!(store.len().await.unwrap(), 6);
}
