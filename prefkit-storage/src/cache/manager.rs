//! LRU-backed [`CacheManager`].

use std::sync::Mutex;

use prefkit_core::PreferenceValue;

use super::lru::LruCache;
use super::traits::{CacheManager, CacheStats};

#[derive(Debug)]
struct Inner {
    lru: LruCache<String, PreferenceValue>,
    stats: CacheStats,
}

/// Thread-safe LRU cache of preference values.
///
/// Each store owns its own instance; there is no shared global cache.
/// A poisoned lock degrades to "always miss" rather than failing reads,
/// since the backend remains the source of truth.
#[derive(Debug)]
pub struct LruCacheManager {
    inner: Mutex<Inner>,
}

impl LruCacheManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                lru: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().map(|i| i.lru.capacity()).unwrap_or(0)
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => inner.lru.keys_by_recency().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl CacheManager for LruCacheManager {
    fn get(&self, key: &str) -> Option<PreferenceValue> {
        let mut inner = self.inner.lock().ok()?;
        let cached = inner.lru.get(key).cloned();
        match cached {
            Some(value) => {
                inner.stats.hits += 1;
                Some(value)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    fn peek(&self, key: &str) -> Option<PreferenceValue> {
        self.inner.lock().ok()?.lru.peek(key).cloned()
    }

    fn put(&self, key: &str, value: PreferenceValue) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        let size = value.size_hint() as u64;
        let replaced = inner.lru.peek(key).map(|v| v.size_hint() as u64);

        if let Some((evicted_key, evicted)) = inner.lru.put(key.to_string(), value) {
            inner.stats.evictions += 1;
            inner.stats.memory_bytes = inner
                .stats
                .memory_bytes
                .saturating_sub(evicted.size_hint() as u64);
            tracing::debug!(key = %evicted_key, "Evicted preference from cache");
        }

        if inner.lru.capacity() > 0 {
            let memory = inner.stats.memory_bytes.saturating_sub(replaced.unwrap_or(0));
            inner.stats.memory_bytes = memory + size;
        }
        inner.stats.entry_count = inner.lru.len() as u64;
    }

    fn remove(&self, key: &str) -> Option<PreferenceValue> {
        let mut inner = self.inner.lock().ok()?;
        let removed = inner.lru.remove(key);
        if let Some(value) = &removed {
            inner.stats.memory_bytes = inner
                .stats
                .memory_bytes
                .saturating_sub(value.size_hint() as u64);
        }
        inner.stats.entry_count = inner.lru.len() as u64;
        removed
    }

    fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.lru.clear();
            inner.stats.entry_count = 0;
            inner.stats.memory_bytes = 0;
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().map(|i| i.lru.len()).unwrap_or(0)
    }

    fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|i| i.stats.clone())
            .unwrap_or_default()
    }
}
