use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use switchboard_core::events::SessionNotification;
use switchboard_core::ids::SessionId;

/// Session-scoped view over the shared notification channel. One listener is
/// created per request and consumed while the prompt is in flight; dropping
/// it is the unsubscribe, so teardown happens exactly once on every exit
/// path.
pub struct SessionListener {
    rx: broadcast::Receiver<SessionNotification>,
    session_id: SessionId,
}

impl SessionListener {
    pub fn new(rx: broadcast::Receiver<SessionNotification>, session_id: SessionId) -> Self {
        Self { rx, session_id }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Await the next notification addressed to this session. Traffic for
    /// other sessions is skipped. Returns `None` once the channel closes.
    pub async fn next_event(&mut self) -> Option<SessionNotification> {
        loop {
            match self.rx.recv().await {
                Ok(notification) if notification.session_id == self.session_id => {
                    return Some(notification)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(session_id = %self.session_id, skipped, "listener lagged, notifications dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Collect the matching notifications already buffered, without waiting.
    /// Used after the prompt resolves to pick up anything that raced the
    /// response.
    pub fn drain(&mut self) -> Vec<SessionNotification> {
        let mut drained = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(notification) if notification.session_id == self.session_id => {
                    drained.push(notification)
                }
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(session_id = %self.session_id, skipped, "listener lagged, notifications dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return drained,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(raw: &str) -> SessionId {
        SessionId::from_raw(raw)
    }

    #[tokio::test]
    async fn next_event_skips_other_sessions() {
        let (tx, rx) = broadcast::channel(16);
        let mut listener = SessionListener::new(rx, sid("mine"));

        tx.send(SessionNotification::text(sid("other"), "noise")).unwrap();
        tx.send(SessionNotification::text(sid("mine"), "signal")).unwrap();

        let got = listener.next_event().await.unwrap();
        assert_eq!(got.session_id, sid("mine"));
    }

    #[tokio::test]
    async fn next_event_returns_none_when_the_channel_closes() {
        let (tx, rx) = broadcast::channel(16);
        let mut listener = SessionListener::new(rx, sid("mine"));

        drop(tx);
        assert!(listener.next_event().await.is_none());
    }

    #[tokio::test]
    async fn drain_collects_only_matching_buffered_events() {
        let (tx, rx) = broadcast::channel(16);
        let mut listener = SessionListener::new(rx, sid("mine"));

        tx.send(SessionNotification::text(sid("mine"), "a")).unwrap();
        tx.send(SessionNotification::text(sid("other"), "b")).unwrap();
        tx.send(SessionNotification::text(sid("mine"), "c")).unwrap();

        let drained = listener.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|n| n.session_id == sid("mine")));
    }

    #[tokio::test]
    async fn drain_on_an_empty_channel_returns_nothing() {
        let (_tx, rx) = broadcast::channel::<SessionNotification>(16);
        let mut listener = SessionListener::new(rx, sid("mine"));
        assert!(listener.drain().is_empty());
    }

    #[tokio::test]
    async fn lagged_listener_recovers_and_keeps_reading() {
        let (tx, rx) = broadcast::channel(1);
        let mut listener = SessionListener::new(rx, sid("mine"));

        tx.send(SessionNotification::text(sid("mine"), "1")).unwrap();
        tx.send(SessionNotification::text(sid("mine"), "2")).unwrap();
        tx.send(SessionNotification::text(sid("mine"), "3")).unwrap();

        // Capacity one: the oldest events were overwritten, the newest
        // survives past the lag report.
        let got = listener.next_event().await.unwrap();
        assert_eq!(
            got.blocks()[0],
            switchboard_core::content::ContentBlock::Text { text: "3".to_string() }
        );
    }
}
