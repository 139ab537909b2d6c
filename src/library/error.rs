//! Per-item error taxonomy for library operations

use crate::fetch::FetchError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors reported by library operations.
///
/// Batch operations carry these as values inside each outcome; a failure
/// for one identifier never ends the batch.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The identifier already has a stored record
    #[error("already in library: {0}")]
    AlreadyExists(String),

    /// The fetcher could not produce a record
    #[error("fetch failed for {identifier}: {source}")]
    FetchFailed {
        identifier: String,
        #[source]
        source: FetchError,
    },

    /// Record and annotation existence diverged for the identifier
    #[error("store inconsistency for {identifier}: {detail}")]
    StoreInconsistency { identifier: String, detail: String },

    /// Nothing is stored under the identifier
    #[error("not in library: {0}")]
    NotFound(String),

    /// The batch was cancelled before this identifier was dispatched
    #[error("cancelled before fetching {0}")]
    Cancelled(String),

    /// Processing this identifier panicked; the rest of the batch went on
    #[error("worker panicked on {identifier}: {detail}")]
    WorkerPanicked { identifier: String, detail: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LibraryError {
    pub fn fetch_failed(identifier: impl Into<String>, source: FetchError) -> Self {
        Self::FetchFailed {
            identifier: identifier.into(),
            source,
        }
    }

    pub fn inconsistency(identifier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::StoreInconsistency {
            identifier: identifier.into(),
            detail: detail.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Self::StoreInconsistency { .. })
    }
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        assert!(LibraryError::AlreadyExists("x".into()).is_duplicate());
        assert!(!LibraryError::NotFound("x".into()).is_duplicate());
        assert!(LibraryError::inconsistency("x", "annotation missing").is_inconsistency());
    }

    #[test]
    fn fetch_failure_keeps_cause() {
        let err = LibraryError::fetch_failed("x", FetchError::Parsing("no title".into()));
        assert_eq!(err.to_string(), "fetch failed for x: parsing error: no title");
        match err {
            LibraryError::FetchFailed { source, .. } => {
                assert_eq!(source, FetchError::Parsing("no title".into()))
            }
            _ => panic!("wrong variant"),
        }
    }
}
