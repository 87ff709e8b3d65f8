//! Cooperative cancellation token

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation flag shared between a follow loop and whoever stops it.
///
/// Cancelling is sticky and idempotent. The loop observes the flag only at
/// its checkpoints, either by polling [`is_cancelled`](Self::is_cancelled) or
/// by racing [`cancelled`](Self::cancelled) against a wait.
#[derive(Clone, Debug)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create an uncancelled token
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // Sender outlives `self`
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
