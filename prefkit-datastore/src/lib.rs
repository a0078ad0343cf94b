//! prefkit Datastore - Reactive Preferences
//!
//! Typed, cached and observable preferences over any
//! [`Settings`](prefkit_storage::Settings) backend.
//!
//! ```text
//! PreferencesRepository
//!         │
//! ReactivePreferencesDataStore ──► ValueObserver / ChangeNotifier
//!         │
//!   validator → type registry → cache → Settings (memory | LMDB)
//!         │
//!     Dispatcher (inline | blocking pool)
//! ```

mod dispatcher;
mod repository;
mod store;

pub use dispatcher::Dispatcher;
pub use repository::PreferencesRepository;
pub use store::{DataStoreBuilder, ReactivePreferencesDataStore};

pub use prefkit_core::{
    ChangeEvent, ChangeKind, DataStoreConfig, DispatchMode, Preference, PreferenceKind,
    PreferenceValue, PrefsError, PrefsResult,
};
pub use prefkit_storage::{CacheStats, LmdbSettings, MemorySettings, Settings};
