//! Page fetcher contract
//!
//! Fetching and parsing a page is done by a collaborator outside this
//! crate. The orchestrators only need a freshly parsed `Record` or a typed
//! reason why there is none. Timeouts and retries are the fetcher's own
//! business; nothing here retries.

use crate::model::Record;
use async_trait::async_trait;
use thiserror::Error;

/// Why a page could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request failed or returned a non-success status
    #[error("network error: {0}")]
    Network(String),

    /// Response arrived but did not have the expected structure
    #[error("parsing error: {0}")]
    Parsing(String),
}

/// Fetches the remote representation of one identifier.
///
/// Implementations must be thread-safe; a batch calls `fetch_record`
/// from several workers at once.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and parse the page behind `identifier`
    async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        assert_eq!(
            FetchError::Network("status 503".into()).to_string(),
            "network error: status 503"
        );
        assert_eq!(
            FetchError::Parsing("missing title".into()).to_string(),
            "parsing error: missing title"
        );
    }
}
