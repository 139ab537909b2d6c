//! Single-owner in-memory mirror of the library
//!
//! Holds one `MergedView` per identifier plus the existence index. Only
//! the consumer that drains outcome streams mutates it; workers never see
//! it. Every mutation swaps a whole entry, so a reader never pairs a stale
//! annotation with a fresh record or the other way round.

use super::index::ExistenceIndex;
use crate::model::{Annotation, MergedView};
use crate::storage::{LibraryStore, StorageResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LibraryCollection {
    entries: Vec<MergedView>,
    index: ExistenceIndex,
}

impl LibraryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mirror from everything in the store.
    ///
    /// A record whose annotation is missing stays in the index (it still
    /// blocks re-import) but gets no entry; the divergence is logged.
    pub fn load(store: &dyn LibraryStore) -> StorageResult<Self> {
        let mut annotations: HashMap<String, Annotation> = store
            .load_annotations()?
            .into_iter()
            .map(|a| (a.identifier.clone(), a))
            .collect();

        let mut collection = Self::new();
        for record in store.load_records()? {
            collection.index.insert(record.identifier.clone());
            match annotations.remove(&record.identifier) {
                Some(annotation) => collection.entries.push(MergedView::new(record, annotation)),
                None => tracing::warn!(
                    identifier = %record.identifier,
                    "stored record has no annotation, leaving it out of the view"
                ),
            }
        }
        for orphan in annotations.keys() {
            tracing::warn!(identifier = %orphan, "stored annotation has no record");
        }

        tracing::info!(entries = collection.entries.len(), "library loaded");
        Ok(collection)
    }

    pub fn entries(&self) -> &[MergedView] {
        &self.entries
    }

    pub fn index(&self) -> &ExistenceIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.entries.iter().map(|v| v.identifier().to_string()).collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&MergedView> {
        self.position(identifier).map(|i| &self.entries[i])
    }

    /// Add a freshly imported item
    pub fn apply_import(&mut self, view: MergedView) {
        self.index.insert(view.identifier());
        self.upsert(view);
    }

    /// Take the refreshed record from a sync outcome.
    ///
    /// The annotation already in the collection wins over the one the
    /// worker read: it reflects every update this consumer has applied.
    pub fn apply_sync(&mut self, view: MergedView) {
        let Some(i) = self.position(view.identifier()) else {
            self.index.insert(view.identifier());
            self.entries.push(view);
            return;
        };
        let (record, _) = view.into_parts();
        self.entries[i] = self.entries[i].with_record(record);
    }

    /// Swap in an updated annotation, keeping the current record.
    ///
    /// Returns the new view, or `None` if the identifier has no entry.
    pub fn replace_annotation(&mut self, annotation: Annotation) -> Option<&MergedView> {
        let i = self.position(&annotation.identifier)?;
        self.entries[i] = self.entries[i].with_annotation(annotation);
        Some(&self.entries[i])
    }

    /// Drop an item from both the entries and the index
    pub fn remove(&mut self, identifier: &str) -> Option<MergedView> {
        self.index.remove(identifier);
        self.position(identifier).map(|i| self.entries.remove(i))
    }

    fn upsert(&mut self, view: MergedView) {
        match self.position(view.identifier()) {
            Some(i) => self.entries[i] = view,
            None => self.entries.push(view),
        }
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.entries.iter().position(|v| v.identifier() == identifier)
    }
}
