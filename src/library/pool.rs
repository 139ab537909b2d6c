//! Fixed-size worker pool shared by the import and sync orchestrators
//!
//! A batch spawns `min(concurrency, queue length)` tokio tasks that drain
//! one shared queue. Each worker handles one unit at a time, so at most
//! `concurrency` fetches are ever in flight. The pool lives only as long
//! as the batch: workers exit when the queue is empty, and the outcome
//! channel closes when the last worker drops its sender. A unit that
//! panics reports `WorkerPanicked` and its worker moves on to the next.

use super::cancel::CancellationToken;
use super::error::LibraryError;
use super::outcome::Outcome;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// One unit of queued work for a batch
#[derive(Debug)]
pub(crate) struct WorkUnit<P> {
    pub identifier: String,
    pub payload: P,
}

/// The per-unit job a pool runs
#[async_trait]
pub(crate) trait BatchWorker: Send + Sync + 'static {
    type Payload: Send + 'static;
    type Outcome: Outcome;

    /// Fetch and persist one identifier
    async fn process(&self, unit: WorkUnit<Self::Payload>) -> Self::Outcome;
}

/// Spawn the pool for one batch. Must be called from within a Tokio runtime.
pub(crate) fn spawn_pool<W: BatchWorker>(
    worker: Arc<W>,
    units: Vec<WorkUnit<W::Payload>>,
    concurrency: usize,
    cancel: CancellationToken,
    tx: UnboundedSender<W::Outcome>,
) {
    if units.is_empty() {
        return;
    }
    let pool_size = concurrency.max(1).min(units.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(units)));

    for slot in 0..pool_size {
        let worker = worker.clone();
        let queue = queue.clone();
        let cancel = cancel.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            loop {
                // a dropped stream means nobody is listening; start nothing new
                if tx.is_closed() {
                    tracing::debug!(slot, "outcome stream dropped, worker exiting");
                    break;
                }
                let Some(unit) = next_unit(&queue) else {
                    break;
                };

                let identifier = unit.identifier.clone();
                let outcome = if cancel.is_cancelled() {
                    <W::Outcome as Outcome>::new(
                        identifier.clone(),
                        Err(LibraryError::Cancelled(identifier)),
                    )
                } else {
                    match AssertUnwindSafe(worker.process(unit)).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(payload) => {
                            let detail = panic_detail(payload.as_ref());
                            tracing::error!(slot, identifier = %identifier, %detail, "worker panicked");
                            <W::Outcome as Outcome>::new(
                                identifier.clone(),
                                Err(LibraryError::WorkerPanicked { identifier, detail }),
                            )
                        }
                    }
                };

                if tx.send(outcome).is_err() {
                    tracing::debug!(slot, "outcome stream dropped after unit finished");
                }
            }
        });
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn next_unit<P>(queue: &Mutex<VecDeque<WorkUnit<P>>>) -> Option<WorkUnit<P>> {
    // a worker that panicked mid-pop leaves a consistent deque behind
    let mut queue = queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    queue.pop_front()
}
