//! itchwatch: a local library of tracked game pages
//!
//! Keeps remote-derived records and user-owned annotations side by side,
//! refreshed through bounded-concurrency import and sync batches.
//!
//! # Core Concepts
//!
//! - **Record**: snapshot of a page, replaced wholesale on refresh
//! - **Annotation**: user state (star, played version, note), patched field by field
//! - **MergedView**: the two joined, with a derived "has update" flag
//!
//! # Example
//!
//! ```
//! use itchwatch::{LibraryStore, MemoryStore, Annotation, Record};
//!
//! let store = MemoryStore::new();
//! let record = Record::new("https://dev.itch.io/game", "Game");
//! assert!(store.insert_entry(&record, &Annotation::new("https://dev.itch.io/game")).unwrap());
//! assert_eq!(store.count_records().unwrap(), 1);
//! ```

pub mod config;
pub mod fetch;
pub mod identifier;
pub mod library;
pub mod model;
pub mod query;
pub mod storage;

pub use config::{Preferences, DEFAULT_FETCH_CONCURRENCY, MAX_FETCH_CONCURRENCY};
pub use fetch::{FetchError, Fetcher};
pub use identifier::{clean_identifier, extract_identifiers, is_game_page};
pub use library::{
    BatchProgress, BatchTally, CancellationToken, ExistenceIndex, ImportOrchestrator, ImportOutcome,
    Library, LibraryCollection, LibraryError, LibraryResult, Outcome, OutcomeStream, SyncOrchestrator,
    SyncOutcome,
};
pub use model::{
    Annotation, AnnotationPatch, ClassificationTag, DevLogEntry, Downloadable, MergedView, Platform,
    Rating, Record, TagCategory,
};
pub use query::{LibraryFilter, SortKey, SortKeys};
pub use storage::{
    EntryRemoval, LibraryStore, MemoryStore, OpenStore, RecordReplacement, SqliteStore, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
