//! Per-identifier outcomes, the stream that carries them, and tallies

use super::error::{LibraryError, LibraryResult};
use crate::model::MergedView;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::UnboundedReceiver;

/// Batches smaller than this report indeterminate progress
pub const PROGRESS_THRESHOLD: usize = 5;

/// Shared shape of import and sync outcomes
pub trait Outcome: Send + 'static {
    fn new(identifier: String, result: LibraryResult<MergedView>) -> Self;
    fn identifier(&self) -> &str;
    fn result(&self) -> &LibraryResult<MergedView>;

    fn is_success(&self) -> bool {
        self.result().is_ok()
    }
}

/// Result of importing one identifier
#[derive(Debug)]
pub struct ImportOutcome {
    pub identifier: String,
    pub result: LibraryResult<MergedView>,
}

/// Result of refreshing one identifier
#[derive(Debug)]
pub struct SyncOutcome {
    pub identifier: String,
    pub result: LibraryResult<MergedView>,
}

macro_rules! impl_outcome {
    ($ty:ty) => {
        impl Outcome for $ty {
            fn new(identifier: String, result: LibraryResult<MergedView>) -> Self {
                Self { identifier, result }
            }
            fn identifier(&self) -> &str {
                &self.identifier
            }
            fn result(&self) -> &LibraryResult<MergedView> {
                &self.result
            }
        }
    };
}

impl_outcome!(ImportOutcome);
impl_outcome!(SyncOutcome);

/// Live stream of outcomes for one batch.
///
/// Yields exactly one item per submitted identifier, in completion order,
/// then ends. Dropping the stream stops workers from taking new
/// identifiers; units already in flight still finish and persist.
#[derive(Debug)]
pub struct OutcomeStream<T> {
    rx: UnboundedReceiver<T>,
    total: usize,
}

impl<T> OutcomeStream<T> {
    pub(crate) fn new(rx: UnboundedReceiver<T>, total: usize) -> Self {
        Self { rx, total }
    }

    /// Number of outcomes this stream will yield
    pub fn total(&self) -> usize {
        self.total
    }

    /// Next outcome, or `None` once every identifier has reported
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Drain the stream into a vector
    pub async fn collect_all(mut self) -> Vec<T> {
        let mut outcomes = Vec::with_capacity(self.total);
        while let Some(outcome) = self.rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl<T> Stream for OutcomeStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Aggregate `{success, duplicate, failed}` counts for a batch.
///
/// Cancelled identifiers count as failed so a retry of
/// `failed_identifiers` picks them up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub failed_identifiers: Vec<String>,
}

impl BatchTally {
    pub fn record<O: Outcome>(&mut self, outcome: &O) {
        match outcome.result() {
            Ok(_) => self.succeeded += 1,
            Err(LibraryError::AlreadyExists(_)) => self.duplicates += 1,
            Err(_) => {
                self.failed += 1;
                self.failed_identifiers.push(outcome.identifier().to_string());
            }
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.duplicates + self.failed
    }
}

/// Caller-side progress for a batch being drained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub tally: BatchTally,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record<O: Outcome>(&mut self, outcome: &O) {
        self.completed += 1;
        self.tally.record(outcome);
    }

    /// Completed fraction, or `None` for batches below [`PROGRESS_THRESHOLD`]
    pub fn fraction(&self) -> Option<f32> {
        if self.total < PROGRESS_THRESHOLD {
            return None;
        }
        Some(self.completed as f32 / self.total as f32)
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}
