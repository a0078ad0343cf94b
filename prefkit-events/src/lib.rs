//! prefkit Events - Change Notification and Value Streams
//!
//! Mutations of a preferences store are published as [`ChangeEvent`]s on a
//! [`ChangeNotifier`]. A [`ValueObserver`] turns those events into
//! per-key streams of freshly read values.
//!
//! ```text
//! put("theme", "dark") ──► notifier ──┬──► value_stream("theme")     dark, dark, ...
//!                                     ├──► distinct_value_stream(..) dark
//!                                     └──► changes_stream()          Added{theme}
//! ```

mod notifier;
mod observer;

pub use notifier::{BroadcastChangeNotifier, ChangeNotifier};
pub use observer::ValueObserver;

pub use prefkit_core::{ChangeEvent, ChangeKind};
