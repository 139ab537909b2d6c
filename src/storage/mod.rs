//! Storage backends for the library
//!
//! The library persists through the `LibraryStore` trait. `SqliteStore`
//! is the persistent implementation; `MemoryStore` keeps everything in
//! process.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{EntryRemoval, LibraryStore, OpenStore, RecordReplacement, StorageError, StorageResult};
