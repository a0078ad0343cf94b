//! Read cache for preference values.
//!
//! The cache is an owned, explicitly sized LRU map per store. It is a
//! non-authoritative view of the backend: misses fall through, writes
//! refresh the entry, removes and clears drop it.

pub mod lru;
pub mod manager;
pub mod traits;

pub use lru::LruCache;
pub use manager::LruCacheManager;
pub use traits::{CacheManager, CacheStats};
