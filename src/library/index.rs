//! In-memory mirror of which identifiers have a stored record

use std::collections::HashSet;

/// Existence index consulted before any fetch is dispatched.
///
/// Owned by the collection and mutated only by whoever drains outcome
/// streams; orchestrators read it when a batch is submitted.
#[derive(Debug, Clone, Default)]
pub struct ExistenceIndex {
    identifiers: HashSet<String>,
}

impl ExistenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    /// Returns true if the identifier was not present before
    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        self.identifiers.insert(identifier.into())
    }

    /// Returns true if the identifier was present
    pub fn remove(&mut self, identifier: &str) -> bool {
        self.identifiers.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExistenceIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            identifiers: iter.into_iter().map(Into::into).collect(),
        }
    }
}
