//! Change events published after every successful mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::PreferenceValue;

/// What kind of mutation produced a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A key was written for the first time.
    Added,
    /// An existing key was overwritten.
    Updated,
    /// An existing key was removed.
    Removed,
    /// The whole store was cleared.
    Cleared,
}

/// A single mutation of the store.
///
/// Events are ephemeral: they are broadcast to current subscribers and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Key that changed. Empty for [`ChangeKind::Cleared`].
    pub key: String,
    pub old_value: Option<PreferenceValue>,
    pub new_value: Option<PreferenceValue>,
    pub kind: ChangeKind,
    pub changed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build the event for a write, choosing `Added` or `Updated` from the
    /// presence of a previous value.
    pub fn written(
        key: impl Into<String>,
        old_value: Option<PreferenceValue>,
        new_value: PreferenceValue,
    ) -> Self {
        let kind = if old_value.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Added
        };
        Self {
            key: key.into(),
            old_value,
            new_value: Some(new_value),
            kind,
            changed_at: Utc::now(),
        }
    }

    pub fn removed(key: impl Into<String>, old_value: Option<PreferenceValue>) -> Self {
        Self {
            key: key.into(),
            old_value,
            new_value: None,
            kind: ChangeKind::Removed,
            changed_at: Utc::now(),
        }
    }

    pub fn cleared() -> Self {
        Self {
            key: String::new(),
            old_value: None,
            new_value: None,
            kind: ChangeKind::Cleared,
            changed_at: Utc::now(),
        }
    }

    /// Whether observers of `key` should re-read after this event.
    pub fn affects(&self, key: &str) -> bool {
        self.kind == ChangeKind::Cleared || self.key == key
    }

    /// Whether the value actually differs between before and after.
    pub fn is_noop(&self) -> bool {
        self.kind == ChangeKind::Updated && self.old_value == self.new_value
    }
}
