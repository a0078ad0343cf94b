//! prefkit Storage - Settings Backends and the Layers Above Them
//!
//! Everything a preferences store needs below the reactive layer:
//! - [`Settings`]: the key-value backend contract, with in-memory and LMDB
//!   implementations
//! - [`TypeRegistry`]: per-kind read/write handlers
//! - [`SerializationStrategy`]: structured values to and from strings
//! - [`PreferencesValidator`]: key/value admissibility
//! - [`cache`]: bounded LRU read cache

pub mod cache;
pub mod handler;
pub mod lmdb;
pub mod memory;
pub mod serialization;
pub mod settings;
pub mod validator;

pub use cache::{CacheManager, CacheStats, LruCache, LruCacheManager};
pub use handler::{
    BoolHandler, DoubleHandler, FloatHandler, IntHandler, LongHandler, StringHandler,
    TypeHandler, TypeRegistry,
};
pub use lmdb::{LmdbSettings, LmdbSettingsError};
pub use memory::MemorySettings;
pub use serialization::{deserialize, serialize, JsonSerializationStrategy, SerializationStrategy};
pub use settings::{read_typed, Settings};
pub use validator::{DefaultPreferencesValidator, PreferencesValidator};
