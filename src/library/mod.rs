//! Import/sync engine
//!
//! - [`ImportOrchestrator`] / [`SyncOrchestrator`]: bounded-concurrency
//!   batches that stream one outcome per identifier
//! - [`LibraryCollection`]: the single-owner mirror those outcomes are
//!   folded into, with its [`ExistenceIndex`]
//! - [`Library`]: facade tying store, fetcher, preferences and collection
//!   together

pub mod backup;
mod cancel;
mod collection;
mod error;
mod import;
mod index;
mod outcome;
mod pool;
mod service;
mod sync;

pub use cancel::CancellationToken;
pub use collection::LibraryCollection;
pub use error::{LibraryError, LibraryResult};
pub use import::ImportOrchestrator;
pub use index::ExistenceIndex;
pub use outcome::{
    BatchProgress, BatchTally, ImportOutcome, Outcome, OutcomeStream, SyncOutcome,
    PROGRESS_THRESHOLD,
};
pub use service::Library;
pub use sync::SyncOrchestrator;
