//! Change notification fan-out.
//!
//! Uses a tokio broadcast channel: every subscriber gets every event sent
//! after it subscribed. A subscriber that falls more than the channel
//! capacity behind lags and skips ahead; writers never wait on readers.

use prefkit_core::ChangeEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Publishes change events to any number of subscribers.
pub trait ChangeNotifier: Send + Sync {
    /// Publish an event. Having no subscribers is not an error.
    fn notify(&self, event: ChangeEvent);

    /// Subscribe to all future events.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;

    /// Number of live subscribers.
    fn subscriber_count(&self) -> usize;
}

/// [`ChangeNotifier`] over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. `DataStoreConfig::validate` rejects
    /// that value before a store is built.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl ChangeNotifier for BroadcastChangeNotifier {
    fn notify(&self, event: ChangeEvent) {
        let key = event.key.clone();
        let kind = event.kind;
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(key = %key, kind = ?kind, receivers, "Broadcast change");
            }
            Err(_) => {
                debug!(key = %key, kind = ?kind, "No receivers for change");
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefkit_core::{ChangeKind, PreferenceValue};
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        let notifier = BroadcastChangeNotifier::new(4);
        notifier.notify(ChangeEvent::cleared());
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_event() {
        let notifier = BroadcastChangeNotifier::new(4);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.notify(ChangeEvent::written("k", None, PreferenceValue::Int(1)));

        assert_eq!(a.recv().await.unwrap().kind, ChangeKind::Added);
        assert_eq!(b.recv().await.unwrap().kind, ChangeKind::Added);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let notifier = BroadcastChangeNotifier::new(4);
        notifier.notify(ChangeEvent::cleared());
        let mut rx = notifier.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let notifier = BroadcastChangeNotifier::new(2);
        let mut rx = notifier.subscribe();
        for i in 0..5 {
            notifier.notify(ChangeEvent::written("k", None, PreferenceValue::Int(i)));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        let next = rx.recv().await.unwrap();
        assert_eq!(next.new_value, Some(PreferenceValue::Int(3)));
    }
}
