use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use switchboard_core::events::SessionNotification;

/// Default buffer size for the notification channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// The shared channel a transport emits session notifications into. One bus
/// serves every active session; receivers filter by session id.
pub struct SessionEventBus {
    tx: broadcast::Sender<SessionNotification>,
    emitted: AtomicU64,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            emitted: AtomicU64::new(0),
        }
    }

    /// Publish a notification. Returns how many subscribers received it;
    /// zero subscribers is not an error.
    pub fn emit(&self, notification: SessionNotification) -> usize {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        match self.tx.send(notification) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!("notification emitted with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total notifications emitted over the bus lifetime.
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::ids::SessionId;

    #[tokio::test]
    async fn subscriber_receives_notification() {
        let bus = SessionEventBus::new();
        let mut rx = bus.subscribe();

        let delivered = bus.emit(SessionNotification::text(SessionId::from_raw("s1"), "Hi"));
        assert_eq!(delivered, 1);

        let n = rx.recv().await.unwrap();
        assert_eq!(n.session_id.as_str(), "s1");
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_silent() {
        let bus = SessionEventBus::new();
        let delivered = bus.emit(SessionNotification::text(SessionId::from_raw("s1"), "Hi"));
        assert_eq!(delivered, 0);
        assert_eq!(bus.emitted_count(), 1);
    }

    #[tokio::test]
    async fn subscriber_count_tracks_receivers() {
        let bus = SessionEventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        drop(rx2);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn all_subscribers_see_every_notification() {
        let bus = SessionEventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(SessionNotification::text(SessionId::from_raw("a"), "one"));
        bus.emit(SessionNotification::text(SessionId::from_raw("b"), "two"));

        assert_eq!(rx1.recv().await.unwrap().session_id.as_str(), "a");
        assert_eq!(rx1.recv().await.unwrap().session_id.as_str(), "b");
        assert_eq!(rx2.recv().await.unwrap().session_id.as_str(), "a");
        assert_eq!(rx2.recv().await.unwrap().session_id.as_str(), "b");
    }
}
