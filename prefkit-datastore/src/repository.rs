//! Application-facing façade over a shared store.

use std::sync::Arc;

use prefkit_core::{ChangeEvent, Preference, PrefsResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_stream::Stream;

use crate::store::ReactivePreferencesDataStore;

/// Preferences as application code sees them.
///
/// Clones share one store, so a value saved through any clone is visible
/// to, and observed by, all of them.
#[derive(Debug, Clone)]
pub struct PreferencesRepository {
    store: Arc<ReactivePreferencesDataStore>,
}

impl PreferencesRepository {
    pub fn new(store: ReactivePreferencesDataStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_shared(store: Arc<ReactivePreferencesDataStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for cache inspection and raw access.
    pub fn store(&self) -> &ReactivePreferencesDataStore {
        &self.store
    }

    pub async fn save_preference<T: Preference>(&self, key: &str, value: T) -> PrefsResult<()> {
        self.store.put(key, value).await
    }

    pub async fn get_preference<T: Preference>(&self, key: &str, default: T) -> PrefsResult<T> {
        self.store.get(key, default).await
    }

    /// Distinct stream of a preference, starting with its current value.
    pub fn observe_preference<T: Preference>(
        &self,
        key: &str,
        default: T,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<T>> + Send + 'static> {
        self.store.observe(key, default)
    }

    /// Returns whether the key existed.
    pub async fn delete_preference(&self, key: &str) -> PrefsResult<bool> {
        self.store.remove(key).await
    }

    pub async fn has_preference(&self, key: &str) -> PrefsResult<bool> {
        self.store.has_key(key).await
    }

    pub async fn clear_all(&self) -> PrefsResult<()> {
        self.store.clear_all().await
    }

    pub fn observe_changes(&self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        self.store.observe_changes()
    }

    pub async fn save_object<T>(&self, key: &str, value: &T) -> PrefsResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.store.put_serializable(key, value).await
    }

    pub async fn get_object<T>(&self, key: &str, default: T) -> PrefsResult<T>
    where
        T: DeserializeOwned,
    {
        self.store.get_serializable(key, default).await
    }

    pub fn observe_object<T>(
        &self,
        key: &str,
        default: T,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<T>> + Send + 'static>
    where
        T: DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
    {
        self.store.observe_serializable(key, default)
    }
}

impl From<ReactivePreferencesDataStore> for PreferencesRepository {
    fn from(store: ReactivePreferencesDataStore) -> Self {
        Self::new(store)
    }
}
