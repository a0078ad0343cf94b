//! Cache manager trait and statistics.

use prefkit_core::PreferenceValue;

/// Read cache sitting in front of a settings backend.
///
/// The cache is never authoritative: a miss always falls through to the
/// backend, and every write through the store refreshes or drops the
/// cached entry. Implementations must be thread-safe.
pub trait CacheManager: Send + Sync {
    /// Get a cached value, marking it recently used.
    fn get(&self, key: &str) -> Option<PreferenceValue>;

    /// Get a cached value without touching recency or statistics.
    fn peek(&self, key: &str) -> Option<PreferenceValue>;

    /// Cache a value, possibly evicting another entry.
    fn put(&self, key: &str, value: PreferenceValue);

    /// Drop a single entry. Returns the dropped value.
    fn remove(&self, key: &str) -> Option<PreferenceValue>;

    /// Drop every entry.
    fn clear(&self);

    /// Number of cached entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Approximate size of cached values in bytes.
    pub memory_bytes: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
