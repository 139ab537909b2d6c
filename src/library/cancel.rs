//! Batch cancellation
//!
//! Workers look at the token only before taking the next identifier off
//! the queue. A fetch that already started runs to completion and its
//! result is persisted; cancellation just stops new work from starting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Signal {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared cancel flag for one or more batches.
///
/// Clones observe the same flag. Besides polling `is_cancelled`, a
/// consumer can await `cancelled()` to stop draining an outcome stream.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.signal.cancelled.swap(true, Ordering::AcqRel) {
            self.signal.notify.notify_waiters();
        }
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        loop {
            // register before checking so a concurrent cancel is not missed
            let notified = self.signal.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
