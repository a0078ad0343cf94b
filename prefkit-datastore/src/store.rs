//! The reactive preferences data store.
//!
//! Every write goes validator → type handler → backend → cache → notifier.
//! Reads check the cache first and fall through to the backend on a miss.
//! Mutations are serialized per store so the cache always matches the last
//! write issued through it.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use prefkit_core::{
    ChangeEvent, ConfigError, DataStoreConfig, Preference, PreferenceValue, PrefsError,
    PrefsResult, StorageError,
};
use prefkit_events::{BroadcastChangeNotifier, ChangeNotifier, ValueObserver};
use prefkit_storage::{
    deserialize, serialize, CacheManager, CacheStats, DefaultPreferencesValidator,
    JsonSerializationStrategy, LruCacheManager, PreferencesValidator, SerializationStrategy,
    Settings, TypeRegistry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;

type Fetch<T> = Pin<Box<dyn Future<Output = PrefsResult<T>> + Send>>;

// ============================================================================
// SHARED STATE
// ============================================================================

struct Inner {
    settings: Arc<dyn Settings>,
    registry: TypeRegistry,
    serializer: Arc<dyn SerializationStrategy>,
    validator: Arc<dyn PreferencesValidator>,
    cache: LruCacheManager,
    notifier: Arc<dyn ChangeNotifier>,
    dispatcher: Dispatcher,
    config: DataStoreConfig,
    /// Held for the whole backend-write + cache-update of a mutation, and
    /// while a cache miss is filled, so the two never disagree. Guards the
    /// last value [`refresh`](Inner::refresh) saw for each key it was asked
    /// about, kept apart from the bounded cache.
    writes: Mutex<Refreshed>,
}

type Refreshed = HashMap<String, Option<PreferenceValue>>;

impl Inner {
    /// A panic inside a handler or backend poisons the lock. The cache may
    /// then be out of step with the backend, so it is dropped before the
    /// store carries on.
    fn lock_writes(&self) -> MutexGuard<'_, Refreshed> {
        self.writes.lock().unwrap_or_else(|poisoned| {
            warn!("Recovering preferences store after a panicked call");
            let mut refreshed = poisoned.into_inner();
            refreshed.clear();
            self.cache.clear();
            self.writes.clear_poison();
            refreshed
        })
    }

    /// Current value of `key`: cache first, then the backend.
    fn current(&self, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }
        let _guard = self.lock_writes();
        let value = self.settings.read(key)?;
        if let Some(v) = &value {
            self.cache.put(key, v.clone());
        }
        Ok(value)
    }

    fn read_typed<T: Preference>(&self, key: &str) -> PrefsResult<Option<T>> {
        if let Some(value) = self.cache.get(key) {
            return typed(key, value).map(Some);
        }

        let _guard = self.lock_writes();
        match self.registry.read(self.settings.as_ref(), key, T::KIND)? {
            Some(value) => {
                self.cache.put(key, value.clone());
                typed(key, value).map(Some)
            }
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: PreferenceValue) -> PrefsResult<()> {
        let mut refreshed = self.lock_writes();
        let old_value = match self.cache.peek(key) {
            Some(cached) => Some(cached),
            None => self.settings.read(key)?,
        };

        let kind = value.kind();
        self.registry.write(self.settings.as_ref(), key, &value)?;
        // A handler may store something other than what it was given.
        let stored = self.registry.read(self.settings.as_ref(), key, kind)?;
        if let Some(seen) = refreshed.get_mut(key) {
            *seen = stored.clone();
        }

        let event = match stored {
            Some(stored) => {
                self.cache.put(key, stored.clone());
                ChangeEvent::written(key, old_value, stored)
            }
            None => {
                self.cache.remove(key);
                if old_value.is_none() {
                    return Ok(());
                }
                ChangeEvent::removed(key, old_value)
            }
        };
        debug!(key = %key, kind = %kind, change = ?event.kind, "Preference written");
        self.notifier.notify(event);
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefsResult<bool> {
        let mut refreshed = self.lock_writes();
        let old_value = self.settings.read(key)?;
        let existed = self.settings.remove(key)?;
        self.cache.remove(key);
        if let Some(seen) = refreshed.get_mut(key) {
            *seen = None;
        }

        if existed {
            debug!(key = %key, "Preference removed");
            self.notifier.notify(ChangeEvent::removed(key, old_value));
        }
        Ok(existed)
    }

    fn refresh(&self, key: &str) -> PrefsResult<bool> {
        let mut refreshed = self.lock_writes();
        let known = match self.cache.peek(key) {
            Some(cached) => Some(cached),
            None => refreshed.get(key).cloned().flatten(),
        };
        let stored = self.settings.read(key)?;
        refreshed.insert(key.to_string(), stored.clone());
        if known == stored {
            return Ok(false);
        }

        let event = match stored {
            Some(value) => {
                self.cache.put(key, value.clone());
                ChangeEvent::written(key, known, value)
            }
            None => {
                self.cache.remove(key);
                ChangeEvent::removed(key, known)
            }
        };
        debug!(key = %key, change = ?event.kind, "Preference changed outside this store");
        self.notifier.notify(event);
        Ok(true)
    }

    fn clear(&self) -> PrefsResult<()> {
        let mut refreshed = self.lock_writes();
        self.settings.clear()?;
        self.cache.clear();
        refreshed.values_mut().for_each(|seen| *seen = None);
        debug!("Preferences cleared");
        self.notifier.notify(ChangeEvent::cleared());
        Ok(())
    }
}

fn typed<T: Preference>(key: &str, value: PreferenceValue) -> PrefsResult<T> {
    let found = value.kind();
    T::from_value(value).ok_or_else(|| {
        StorageError::TypeMismatch {
            key: key.to_string(),
            expected: T::KIND,
            found,
        }
        .into()
    })
}

// ============================================================================
// STORE
// ============================================================================

/// Typed, cached, observable preferences over a [`Settings`] backend.
///
/// Cloning is cheap and every clone shares the same backend, cache and
/// change stream. Observation streams keep the store alive until dropped.
#[derive(Clone)]
pub struct ReactivePreferencesDataStore {
    inner: Arc<Inner>,
    observer: ValueObserver,
}

impl ReactivePreferencesDataStore {
    /// Store over `settings` with default validator, serializer and registry.
    pub fn new(settings: impl Settings + 'static, config: DataStoreConfig) -> PrefsResult<Self> {
        DataStoreBuilder::new().settings(settings).config(config).build()
    }

    pub fn builder() -> DataStoreBuilder {
        DataStoreBuilder::new()
    }

    pub fn config(&self) -> &DataStoreConfig {
        &self.inner.config
    }

    /// Run `f` against the shared state on the configured dispatcher.
    async fn run<R, F>(&self, f: F) -> PrefsResult<R>
    where
        F: FnOnce(&Inner) -> PrefsResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let result = self.inner.dispatcher.run(move || f(&inner)).await;
        if let Err(PrefsError::Storage(e)) = &result {
            if !matches!(e, StorageError::TypeMismatch { .. }) {
                warn!(error = %e, "Preference backend call failed");
            }
        }
        result
    }

    // === Primitive values ===

    /// Store a primitive value.
    pub async fn put<T: Preference>(&self, key: &str, value: T) -> PrefsResult<()> {
        self.put_value(key, value.into_value()).await
    }

    /// Store a value of whatever kind it carries.
    pub async fn put_value(&self, key: &str, value: PreferenceValue) -> PrefsResult<()> {
        self.inner.validator.validate_key(key)?;
        self.inner.validator.validate_value(key, &value)?;

        let key = key.to_string();
        self.run(move |inner| inner.write(&key, value)).await
    }

    /// Read a primitive value, or `default` if the key is absent.
    pub async fn get<T: Preference>(&self, key: &str, default: T) -> PrefsResult<T> {
        Ok(self.get_optional(key).await?.unwrap_or(default))
    }

    /// Read a primitive value, `None` if the key is absent.
    pub async fn get_optional<T: Preference>(&self, key: &str) -> PrefsResult<Option<T>> {
        self.inner.validator.validate_key(key)?;
        let key = key.to_string();
        self.run(move |inner| inner.read_typed::<T>(&key)).await
    }

    /// Read the raw value of a key without knowing its kind up front.
    pub async fn get_value(&self, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        self.inner.validator.validate_key(key)?;
        let key = key.to_string();
        self.run(move |inner| inner.current(&key)).await
    }

    // === Structured values ===

    /// Store any serializable value as an encoded string.
    pub async fn put_serializable<T>(&self, key: &str, value: &T) -> PrefsResult<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = serialize(self.inner.serializer.as_ref(), value)?;
        self.put_value(key, PreferenceValue::String(encoded)).await
    }

    /// Read a value stored with [`put_serializable`](Self::put_serializable).
    pub async fn get_serializable<T>(&self, key: &str, default: T) -> PrefsResult<T>
    where
        T: DeserializeOwned,
    {
        match self.get_optional::<String>(key).await? {
            Some(raw) => deserialize(self.inner.serializer.as_ref(), key, &raw),
            None => Ok(default),
        }
    }

    // === Keys ===

    pub async fn has_key(&self, key: &str) -> PrefsResult<bool> {
        self.inner.validator.validate_key(key)?;
        let key = key.to_string();
        self.run(move |inner| inner.settings.contains(&key)).await
    }

    /// Remove a key. Returns whether it existed; only then is a change
    /// published.
    pub async fn remove(&self, key: &str) -> PrefsResult<bool> {
        self.inner.validator.validate_key(key)?;
        let key = key.to_string();
        self.run(move |inner| inner.remove(&key)).await
    }

    /// Re-read `key` from the backend and publish a change if it differs
    /// from the last value this store knew. Used when another process
    /// shares the backend.
    ///
    /// The known value is the cached one, else whatever the previous
    /// refresh or local write of `key` left behind. A key this store has
    /// never cached nor refreshed counts as changed if it exists.
    pub async fn refresh(&self, key: &str) -> PrefsResult<bool> {
        self.inner.validator.validate_key(key)?;
        let key = key.to_string();
        self.run(move |inner| inner.refresh(&key)).await
    }

    /// Remove every key and publish a single [`ChangeKind::Cleared`](prefkit_core::ChangeKind::Cleared).
    pub async fn clear_all(&self) -> PrefsResult<()> {
        self.run(|inner| inner.clear()).await
    }

    pub async fn keys(&self) -> PrefsResult<BTreeSet<String>> {
        self.run(|inner| inner.settings.keys()).await
    }

    /// Number of stored keys.
    pub async fn len(&self) -> PrefsResult<usize> {
        self.run(|inner| inner.settings.size()).await
    }

    pub async fn is_empty(&self) -> PrefsResult<bool> {
        Ok(self.len().await? == 0)
    }

    // === Cache ===

    pub fn cache_size(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Drop one cached entry. The next read goes to the backend.
    pub fn invalidate_cache(&self, key: &str) -> bool {
        self.inner.cache.remove(key).is_some()
    }

    pub fn invalidate_all_cache(&self) {
        self.inner.cache.clear();
    }

    // === Observation ===

    /// Current value of `key`, then each time it changes to a different value.
    pub fn observe<T: Preference>(
        &self,
        key: &str,
        default: T,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<T>> + Send + 'static> {
        self.inner.validator.validate_key(key)?;
        let getter = self.getter(key, default);
        Ok(self.observer.distinct_value_stream(key, getter))
    }

    /// Current value of `key`, then again after every change event touching
    /// it, even if the value is unchanged.
    pub fn observe_every<T: Preference>(
        &self,
        key: &str,
        default: T,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<T>> + Send + 'static> {
        self.inner.validator.validate_key(key)?;
        let getter = self.getter(key, default);
        Ok(self.observer.value_stream(key, getter))
    }

    /// Distinct stream of the raw value of `key`, whatever its kind.
    /// `None` while the key is absent.
    pub fn observe_value(
        &self,
        key: &str,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<Option<PreferenceValue>>> + Send + 'static> {
        self.inner.validator.validate_key(key)?;
        let store = self.clone();
        let owned_key = key.to_string();
        let getter = move || {
            let store = store.clone();
            let key = owned_key.clone();
            async move { store.get_value(&key).await }
        };
        Ok(self.observer.distinct_value_stream(key, getter))
    }

    /// Distinct stream of a structured value.
    pub fn observe_serializable<T>(
        &self,
        key: &str,
        default: T,
    ) -> PrefsResult<impl Stream<Item = PrefsResult<T>> + Send + 'static>
    where
        T: DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
    {
        self.inner.validator.validate_key(key)?;
        let store = self.clone();
        let owned_key = key.to_string();
        let getter = move || {
            let store = store.clone();
            let key = owned_key.clone();
            let default = default.clone();
            async move { store.get_serializable(&key, default).await }
        };
        Ok(self.observer.distinct_value_stream(key, getter))
    }

    /// Every change made through this store.
    pub fn observe_changes(&self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        self.observer.changes_stream()
    }

    /// Changes to any of `keys`, plus clears.
    pub fn observe_keys<I, K>(&self, keys: I) -> impl Stream<Item = ChangeEvent> + Send + 'static
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        self.observer.keys_stream(keys)
    }

    fn getter<T: Preference>(
        &self,
        key: &str,
        default: T,
    ) -> impl Fn() -> Fetch<T> + Send + 'static {
        let store = self.clone();
        let key = key.to_string();
        move || {
            let store = store.clone();
            let key = key.clone();
            let default = default.clone();
            Box::pin(async move { store.get(&key, default).await }) as Fetch<T>
        }
    }
}

impl std::fmt::Debug for ReactivePreferencesDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactivePreferencesDataStore")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .field("registry", &self.inner.registry)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Assembles a [`ReactivePreferencesDataStore`].
///
/// Only the settings backend is required. Everything else defaults from
/// the [`DataStoreConfig`].
#[derive(Default)]
pub struct DataStoreBuilder {
    settings: Option<Arc<dyn Settings>>,
    config: DataStoreConfig,
    validator: Option<Arc<dyn PreferencesValidator>>,
    serializer: Option<Arc<dyn SerializationStrategy>>,
    registry: Option<TypeRegistry>,
    runtime: Option<Handle>,
}

impl DataStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: impl Settings + 'static) -> Self {
        self.settings = Some(Arc::new(settings));
        self
    }

    /// Use a backend that is also held elsewhere.
    pub fn shared_settings(mut self, settings: Arc<dyn Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn config(mut self, config: DataStoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn validator(mut self, validator: impl PreferencesValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn serializer(mut self, serializer: impl SerializationStrategy + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run background calls on this runtime instead of the caller's.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> PrefsResult<ReactivePreferencesDataStore> {
        self.config.validate()?;

        let settings = self.settings.ok_or_else(|| {
            PrefsError::Config(ConfigError::InvalidValue {
                field: "settings".to_string(),
                value: "none".to_string(),
                reason: "a settings backend is required".to_string(),
            })
        })?;

        let dispatcher = match (Dispatcher::from(self.config.dispatcher), self.runtime) {
            (Dispatcher::Background(_), Some(handle)) => Dispatcher::on(handle),
            (dispatcher, _) => dispatcher,
        };

        let notifier: Arc<dyn ChangeNotifier> =
            Arc::new(BroadcastChangeNotifier::new(self.config.change_buffer));
        let observer = ValueObserver::new(Arc::clone(&notifier));

        let validator = self
            .validator
            .unwrap_or_else(|| {
                Arc::new(DefaultPreferencesValidator::from_config(&self.config))
                    as Arc<dyn PreferencesValidator>
            });
        let serializer = self
            .serializer
            .unwrap_or_else(|| {
                Arc::new(JsonSerializationStrategy::new()) as Arc<dyn SerializationStrategy>
            });

        debug!(
            cache_capacity = self.config.cache_capacity,
            change_buffer = self.config.change_buffer,
            dispatcher = ?dispatcher.mode(),
            "Building preferences data store"
        );

        let inner = Inner {
            settings,
            registry: self.registry.unwrap_or_default(),
            serializer,
            validator,
            cache: LruCacheManager::new(self.config.cache_capacity),
            notifier,
            dispatcher,
            config: self.config,
            writes: Mutex::new(HashMap::new()),
        };

        Ok(ReactivePreferencesDataStore {
            inner: Arc::new(inner),
            observer,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
