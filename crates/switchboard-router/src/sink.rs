use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use switchboard_core::progress::ProgressUpdate;

/// Default buffer size for the progress channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Per-request progress callback. Failures are logged and swallowed; a
/// detached UI must never fail the request it was watching.
pub type ProgressCallback = Arc<dyn Fn(&ProgressUpdate) -> anyhow::Result<()> + Send + Sync>;

/// Fan-out for progress updates: a process-wide broadcast channel that hosts
/// subscribe to, plus the optional per-request callback. Delivery is
/// best-effort on both paths.
#[derive(Clone)]
pub struct ProgressSink {
    tx: broadcast::Sender<ProgressUpdate>,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Push one update to the callback and the channel, absorbing failures
    /// on both paths.
    pub fn emit(&self, update: ProgressUpdate, callback: Option<&ProgressCallback>) {
        if let Some(callback) = callback {
            if let Err(error) = callback(&update) {
                warn!(error = %error, "progress callback failed");
            }
        }
        if self.tx.send(update).is_err() {
            trace!("progress update emitted with no subscribers");
        }
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}
