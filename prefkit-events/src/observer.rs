//! Per-key observable value streams.
//!
//! A value stream re-reads a key whenever a change event touches it and
//! yields the fresh value. Two flavors:
//!
//! - [`ValueObserver::value_stream`] yields on every relevant event, even if
//!   the value read back is the same as before.
//! - [`ValueObserver::distinct_value_stream`] suppresses a value equal to
//!   the previous one (distinct-until-changed).
//!
//! Both subscribe before the first read, so a write that races with the
//! initial read is never lost.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use async_stream::stream;
use prefkit_core::{ChangeEvent, PrefsResult};
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::notifier::ChangeNotifier;

/// Builds streams over a [`ChangeNotifier`].
#[derive(Clone)]
pub struct ValueObserver {
    notifier: Arc<dyn ChangeNotifier>,
}

impl ValueObserver {
    pub fn new(notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { notifier }
    }

    /// Yield `getter()` now and again after every change touching `key`.
    ///
    /// If the subscriber lags, the key is re-read once since any of the
    /// skipped events may have touched it. The stream ends when the
    /// notifier is dropped.
    pub fn value_stream<T, F, Fut>(
        &self,
        key: &str,
        getter: F,
    ) -> impl Stream<Item = PrefsResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = PrefsResult<T>> + Send + 'static,
    {
        let key = key.to_string();
        let mut rx = self.notifier.subscribe();

        stream! {
            yield getter().await;

            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if event.affects(&key) {
                            yield getter().await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(key = %key, skipped, "Value observer lagged, re-reading");
                        yield getter().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    /// Like [`value_stream`](Self::value_stream), but never yields a value
    /// equal to the last one yielded.
    ///
    /// Errors always pass through and reset the comparison, so the first
    /// good value after an error is yielded even if it matches the value
    /// before the error.
    pub fn distinct_value_stream<T, F, Fut>(
        &self,
        key: &str,
        getter: F,
    ) -> impl Stream<Item = PrefsResult<T>> + Send + 'static
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = PrefsResult<T>> + Send + 'static,
    {
        let values = self.value_stream(key, getter);

        stream! {
            let mut last: Option<T> = None;

            for await item in values {
                match item {
                    Ok(value) => {
                        if last.as_ref() == Some(&value) {
                            continue;
                        }
                        last = Some(value.clone());
                        yield Ok(value);
                    }
                    Err(e) => {
                        last = None;
                        yield Err(e);
                    }
                }
            }
        }
    }

    /// Every change event. Lagged gaps are skipped silently.
    pub fn changes_stream(&self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        BroadcastStream::new(self.notifier.subscribe()).filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Change stream lagged");
                None
            }
        })
    }

    /// Change events for any key in `keys`, plus store-wide clears.
    pub fn keys_stream(
        &self,
        keys: BTreeSet<String>,
    ) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        self.changes_stream()
            .filter(move |event| keys.iter().any(|key| event.affects(key)))
    }
}

impl std::fmt::Debug for ValueObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueObserver")
            .field("subscribers", &self.notifier.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::BroadcastChangeNotifier;
    use prefkit_core::{ChangeKind, PreferenceValue, PrefsError, StorageError};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    const QUIET: Duration = Duration::from_millis(50);

    fn setup() -> (Arc<BroadcastChangeNotifier>, ValueObserver, Arc<AtomicI32>) {
        let notifier = Arc::new(BroadcastChangeNotifier::new(16));
        let observer = ValueObserver::new(notifier.clone());
        (notifier, observer, Arc::new(AtomicI32::new(0)))
    }

    fn getter(source: &Arc<AtomicI32>) -> impl Fn() -> std::future::Ready<PrefsResult<i32>> {
        let source = source.clone();
        move || std::future::ready(Ok(source.load(Ordering::SeqCst)))
    }

    fn write(notifier: &BroadcastChangeNotifier, source: &AtomicI32, key: &str, value: i32) {
        let old = source.swap(value, Ordering::SeqCst);
        notifier.notify(ChangeEvent::written(
            key,
            Some(PreferenceValue::Int(old)),
            PreferenceValue::Int(value),
        ));
    }

    #[tokio::test]
    async fn test_value_stream_emits_initial_value() {
        let (_notifier, observer, source) = setup();
        source.store(7, Ordering::SeqCst);

        let stream = observer.value_stream("k", getter(&source));
        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_value_stream_reemits_equal_values() {
        let (notifier, observer, source) = setup();
        let stream = observer.value_stream("k", getter(&source));
        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 0);

        for _ in 0..3 {
            write(&notifier, &source, "k", 5);
        }
        for _ in 0..3 {
            assert_eq!(stream.next().await.unwrap().unwrap(), 5);
        }
    }

    #[tokio::test]
    async fn test_distinct_stream_emits_once_for_repeated_value() {
        let (notifier, observer, source) = setup();
        write(&notifier, &source, "k", 5);

        let stream = observer.distinct_value_stream("k", getter(&source));
        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 5);

        for _ in 0..10 {
            write(&notifier, &source, "k", 5);
        }
        assert!(timeout(QUIET, stream.next()).await.is_err());

        write(&notifier, &source, "k", 6);
        assert_eq!(stream.next().await.unwrap().unwrap(), 6);
    }

    #[tokio::test]
    async fn test_other_keys_are_ignored() {
        let (notifier, observer, source) = setup();
        let stream = observer.value_stream("mine", getter(&source));
        tokio::pin!(stream);
        stream.next().await;

        write(&notifier, &source, "theirs", 1);
        assert!(timeout(QUIET, stream.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_reaches_every_key() {
        let (notifier, observer, source) = setup();
        write(&notifier, &source, "k", 3);
        let stream = observer.distinct_value_stream("k", getter(&source));
        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 3);

        source.store(0, Ordering::SeqCst);
        notifier.notify(ChangeEvent::cleared());
        assert_eq!(stream.next().await.unwrap().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_when_notifier_dropped() {
        let notifier = Arc::new(BroadcastChangeNotifier::new(4));
        let observer = ValueObserver::new(notifier.clone());
        let source = Arc::new(AtomicI32::new(1));
        let stream = observer.value_stream("k", getter(&source));
        drop(observer);
        drop(notifier);

        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_distinct_stream_passes_errors_and_resets() {
        let (notifier, observer, _source) = setup();
        let calls = Arc::new(AtomicI32::new(0));
        let counter = calls.clone();
        let flaky = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n == 1 {
                Err(PrefsError::from(StorageError::LockPoisoned))
            } else {
                Ok(9)
            })
        };

        let stream = observer.distinct_value_stream("k", flaky);
        tokio::pin!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), 9);

        notifier.notify(ChangeEvent::removed("k", None));
        assert!(stream.next().await.unwrap().is_err());

        notifier.notify(ChangeEvent::removed("k", None));
        assert_eq!(stream.next().await.unwrap().unwrap(), 9);
    }

    #[tokio::test]
    async fn test_keys_stream_filters() {
        let (notifier, observer, _source) = setup();
        let keys: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();
        let stream = observer.keys_stream(keys);
        tokio::pin!(stream);

        notifier.notify(ChangeEvent::written("c", None, PreferenceValue::Int(1)));
        notifier.notify(ChangeEvent::written("b", None, PreferenceValue::Int(2)));
        notifier.notify(ChangeEvent::cleared());

        let first = stream.next().await.unwrap();
        assert_eq!(first.key, "b");
        let second = stream.next().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Cleared);
    }
}
