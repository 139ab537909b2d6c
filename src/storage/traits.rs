//! Storage trait definitions

use crate::model::{Annotation, AnnotationPatch, Record};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What `delete_entry` actually removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryRemoval {
    pub record_removed: bool,
    pub annotation_removed: bool,
}

impl EntryRemoval {
    /// Nothing was stored under the identifier
    pub fn is_absent(&self) -> bool {
        !self.record_removed && !self.annotation_removed
    }

    /// Exactly one half of the pair existed
    pub fn is_partial(&self) -> bool {
        self.record_removed != self.annotation_removed
    }
}

/// What `replace_record` found under the identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordReplacement {
    /// No record was stored; nothing was written
    Absent,
    /// The record was replaced; this is the annotation stored beside it
    Replaced(Annotation),
    /// The record was replaced but no annotation is stored beside it
    MissingAnnotation,
}

/// Trait for library storage backends
///
/// Holds two record kinds keyed by identifier: `Record` (replaced
/// wholesale) and `Annotation` (patched). Implementations must be
/// thread-safe (Send + Sync); batch workers call into the store
/// concurrently, each for a different identifier.
pub trait LibraryStore: Send + Sync {
    // === Record Operations ===

    /// Load a record by identifier
    fn load_record(&self, identifier: &str) -> StorageResult<Option<Record>>;

    /// Load every stored record
    fn load_records(&self) -> StorageResult<Vec<Record>>;

    /// Check whether a record exists
    fn contains_record(&self, identifier: &str) -> StorageResult<bool>;

    /// Replace an existing record wholesale and read its annotation in
    /// the same step, so a concurrent delete shows up as `Absent` rather
    /// than as a record without an annotation.
    fn replace_record(&self, record: &Record) -> StorageResult<RecordReplacement>;

    /// Number of stored records
    fn count_records(&self) -> StorageResult<usize>;

    // === Annotation Operations ===

    /// Load an annotation by identifier
    fn load_annotation(&self, identifier: &str) -> StorageResult<Option<Annotation>>;

    /// Load every stored annotation
    fn load_annotations(&self) -> StorageResult<Vec<Annotation>>;

    /// Read-modify-write an annotation as one step.
    ///
    /// Returns the patched annotation, or `None` when nothing is stored.
    fn update_annotation(
        &self,
        identifier: &str,
        patch: &AnnotationPatch,
    ) -> StorageResult<Option<Annotation>>;

    /// Number of stored annotations
    fn count_annotations(&self) -> StorageResult<usize>;

    // === Pair Operations ===

    /// Create a record and its annotation together.
    ///
    /// Returns false (and writes nothing) when a record already exists
    /// under the identifier.
    fn insert_entry(&self, record: &Record, annotation: &Annotation) -> StorageResult<bool>;

    /// Delete a record and its annotation together
    fn delete_entry(&self, identifier: &str) -> StorageResult<EntryRemoval>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: LibraryStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
