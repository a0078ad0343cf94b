//! prefkit Core - Value, Event, Error and Config Types
//!
//! Pure data structures shared by every prefkit crate. Nothing in here
//! touches storage or async runtimes.

pub mod config;
pub mod error;
pub mod event;
pub mod value;

pub use config::{DataStoreConfig, DispatchMode};
pub use error::{
    ConfigError, PrefsError, PrefsResult, SerializationError, StorageError, ValidationError,
};
pub use event::{ChangeEvent, ChangeKind};
pub use value::{Preference, PreferenceKind, PreferenceValue};
