//! The `Library` facade
//!
//! Owns the in-memory collection and is the single consumer of every
//! outcome stream it starts. Batch methods come in two flavours: the bare
//! stream (`import`, `sync`, ...) for callers that drain it themselves and
//! feed outcomes back through `apply_*`, and `run_*` methods that drain,
//! apply, and tally in one call.

use super::cancel::CancellationToken;
use super::collection::LibraryCollection;
use super::error::{LibraryError, LibraryResult};
use super::import::ImportOrchestrator;
use super::outcome::{BatchProgress, BatchTally, ImportOutcome, Outcome, OutcomeStream, SyncOutcome};
use super::sync::SyncOrchestrator;
use crate::config::Preferences;
use crate::fetch::Fetcher;
use crate::model::{Annotation, AnnotationPatch, MergedView};
use crate::query::{self, LibraryFilter, SortKeys};
use crate::storage::{LibraryStore, StorageResult};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

pub struct Library {
    store: Arc<dyn LibraryStore>,
    importer: ImportOrchestrator,
    syncer: SyncOrchestrator,
    preferences: Arc<Preferences>,
    collection: LibraryCollection,
}

impl Library {
    /// Open a library over a store, loading the collection from it
    pub fn open(
        store: Arc<dyn LibraryStore>,
        fetcher: Arc<dyn Fetcher>,
        preferences: Arc<Preferences>,
    ) -> StorageResult<Self> {
        let collection = LibraryCollection::load(store.as_ref())?;
        Ok(Self {
            importer: ImportOrchestrator::new(store.clone(), fetcher.clone()),
            syncer: SyncOrchestrator::new(store.clone(), fetcher),
            store,
            preferences,
            collection,
        })
    }

    pub fn collection(&self) -> &LibraryCollection {
        &self.collection
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn get(&self, identifier: &str) -> Option<&MergedView> {
        self.collection.get(identifier)
    }

    /// Filtered and sorted snapshot of the collection
    pub fn view(&self, filter: &LibraryFilter, keys: &SortKeys) -> Vec<MergedView> {
        query::sort(filter.apply(self.collection.entries()), keys)
    }

    /// Same as [`Library::view`] with the remembered sort keys
    pub fn default_view(&self, filter: &LibraryFilter) -> Vec<MergedView> {
        self.view(filter, &self.preferences.sort_keys())
    }

    // === Batch streams ===

    pub fn import(
        &self,
        identifiers: HashSet<String>,
        cancel: &CancellationToken,
    ) -> OutcomeStream<ImportOutcome> {
        self.importer.import(
            identifiers,
            self.preferences.concurrency(),
            self.collection.index(),
            cancel,
        )
    }

    pub fn import_from_backup(
        &self,
        annotations: Vec<Annotation>,
        cancel: &CancellationToken,
    ) -> OutcomeStream<ImportOutcome> {
        self.importer.import_from_backup(
            annotations,
            self.preferences.concurrency(),
            self.collection.index(),
            cancel,
        )
    }

    pub fn sync(&self, identifiers: Vec<String>, cancel: &CancellationToken) -> OutcomeStream<SyncOutcome> {
        self.syncer.sync(
            identifiers,
            self.preferences.concurrency(),
            self.collection.index(),
            cancel,
        )
    }

    /// Fold one import outcome into the collection
    pub fn apply_import(&mut self, outcome: &ImportOutcome) {
        if let Ok(view) = &outcome.result {
            self.collection.apply_import(view.clone());
        }
    }

    /// Fold one sync outcome into the collection.
    ///
    /// A `NotFound` outcome means the item vanished from the store while
    /// being refreshed, so it leaves the collection as well.
    pub fn apply_sync(&mut self, outcome: &SyncOutcome) {
        match &outcome.result {
            Ok(view) => self.collection.apply_sync(view.clone()),
            Err(LibraryError::NotFound(identifier)) => {
                self.collection.remove(identifier);
            }
            Err(_) => {}
        }
    }

    // === Drained batches ===

    pub async fn run_import(
        &mut self,
        identifiers: HashSet<String>,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchTally {
        let stream = self.import(identifiers, cancel);
        self.drain(stream, Self::apply_import, on_progress, "import").await
    }

    pub async fn run_import_from_backup(
        &mut self,
        annotations: Vec<Annotation>,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchTally {
        let stream = self.import_from_backup(annotations, cancel);
        self.drain(stream, Self::apply_import, on_progress, "backup import").await
    }

    pub async fn run_sync(
        &mut self,
        identifiers: Vec<String>,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchTally {
        let stream = self.sync(identifiers, cancel);
        self.drain(stream, Self::apply_sync, on_progress, "sync").await
    }

    /// Refresh every item in the collection
    pub async fn refresh_all(
        &mut self,
        cancel: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchTally {
        let identifiers = self.collection.identifiers();
        self.run_sync(identifiers, cancel, on_progress).await
    }

    /// Refresh a single item, e.g. when its page is opened
    pub async fn refresh_one(&mut self, identifier: &str) -> LibraryResult<MergedView> {
        let mut stream = self.sync(vec![identifier.to_string()], &CancellationToken::new());
        let outcome = stream
            .recv()
            .await
            .ok_or_else(|| LibraryError::Cancelled(identifier.to_string()))?;
        self.apply_sync(&outcome);
        match outcome.result {
            // the collection entry carries the freshest annotation
            Ok(_) => self
                .collection
                .get(identifier)
                .cloned()
                .ok_or_else(|| LibraryError::NotFound(identifier.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn drain<O: Outcome>(
        &mut self,
        mut stream: OutcomeStream<O>,
        apply: fn(&mut Self, &O),
        mut on_progress: impl FnMut(&BatchProgress),
        label: &'static str,
    ) -> BatchTally {
        let mut progress = BatchProgress::new(stream.total());
        while let Some(outcome) = stream.recv().await {
            apply(self, &outcome);
            progress.record(&outcome);
            on_progress(&progress);
        }

        let tally = progress.tally;
        tracing::info!(
            batch = label,
            succeeded = tally.succeeded,
            duplicates = tally.duplicates,
            failed = tally.failed,
            "batch finished"
        );
        tally
    }

    // === Annotation intents ===

    /// Patch an annotation and swap the merged view in the collection.
    ///
    /// Nothing is written unless a record backs the identifier.
    pub fn update_annotation(
        &mut self,
        identifier: &str,
        patch: &AnnotationPatch,
    ) -> LibraryResult<Annotation> {
        if !self.store.contains_record(identifier)? {
            if self.store.load_annotation(identifier)?.is_some() {
                tracing::warn!(identifier = %identifier, "annotation has no record");
                return Err(LibraryError::inconsistency(
                    identifier,
                    "annotation present but record missing",
                ));
            }
            return Err(LibraryError::NotFound(identifier.to_string()));
        }

        let Some(annotation) = self.store.update_annotation(identifier, patch)? else {
            tracing::warn!(identifier = %identifier, "record has no annotation");
            return Err(LibraryError::inconsistency(
                identifier,
                "record present but annotation missing",
            ));
        };

        if self.collection.replace_annotation(annotation.clone()).is_none() {
            match self.store.load_record(identifier)? {
                Some(record) => self
                    .collection
                    .apply_import(MergedView::new(record, annotation.clone())),
                None => {
                    tracing::warn!(identifier = %identifier, "annotation has no record");
                    return Err(LibraryError::inconsistency(
                        identifier,
                        "annotation present but record missing",
                    ));
                }
            }
        }
        Ok(annotation)
    }

    pub fn toggle_star(&mut self, identifier: &str) -> LibraryResult<Annotation> {
        let starred = match self.collection.get(identifier) {
            Some(view) => view.starred(),
            None => self
                .store
                .load_annotation(identifier)?
                .map(|a| a.starred)
                .unwrap_or(false),
        };
        self.update_annotation(identifier, &AnnotationPatch::new().starred(!starred))
    }

    /// Record that the current version was played just now.
    ///
    /// Items without downloadable files have no version label; only the
    /// timestamp changes for them.
    pub fn mark_played(&mut self, identifier: &str) -> LibraryResult<Annotation> {
        let mut patch = AnnotationPatch::new().last_played_at(Utc::now());
        if let Some(label) = self
            .collection
            .get(identifier)
            .and_then(|view| view.current_version_label())
        {
            patch = patch.last_played_version(label);
        }
        self.update_annotation(identifier, &patch)
    }

    // === Removal and export ===

    /// Delete an item's record and annotation together.
    ///
    /// Removing only one half is reported as a store inconsistency; the
    /// item leaves the collection either way.
    pub fn delete(&mut self, identifier: &str) -> LibraryResult<()> {
        let removal = self.store.delete_entry(identifier)?;
        self.collection.remove(identifier);

        if removal.is_absent() {
            return Err(LibraryError::NotFound(identifier.to_string()));
        }
        if removal.is_partial() {
            let detail = if removal.record_removed {
                "record deleted but no annotation was stored"
            } else {
                "annotation deleted but no record was stored"
            };
            tracing::warn!(identifier = %identifier, detail, "partial delete");
            return Err(LibraryError::inconsistency(identifier, detail));
        }
        tracing::info!(identifier = %identifier, "removed from library");
        Ok(())
    }

    /// Every stored annotation, ordered by identifier
    pub fn export_all(&self) -> StorageResult<Vec<Annotation>> {
        let mut annotations = self.store.load_annotations()?;
        annotations.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(annotations)
    }
}
