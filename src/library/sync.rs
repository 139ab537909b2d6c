//! Sync orchestrator: re-fetch identifiers already in the library and
//! replace their records, leaving annotations alone.

use super::cancel::CancellationToken;
use super::error::LibraryError;
use super::index::ExistenceIndex;
use super::outcome::{Outcome, OutcomeStream, SyncOutcome};
use super::pool::{spawn_pool, BatchWorker, WorkUnit};
use crate::fetch::Fetcher;
use crate::model::{MergedView, Record};
use crate::storage::{LibraryStore, RecordReplacement};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives refresh batches against one store and fetcher
#[derive(Clone)]
pub struct SyncOrchestrator {
    worker: Arc<SyncWorker>,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<dyn LibraryStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            worker: Arc::new(SyncWorker { store, fetcher }),
        }
    }

    /// Refresh the given identifiers.
    ///
    /// Repeated identifiers are refreshed once and report once. Identifiers
    /// missing from the index report `NotFound` without a fetch. Must be
    /// called from within a Tokio runtime.
    pub fn sync(
        &self,
        identifiers: Vec<String>,
        concurrency: usize,
        index: &ExistenceIndex,
        cancel: &CancellationToken,
    ) -> OutcomeStream<SyncOutcome> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut seen = HashSet::new();
        let mut units = Vec::new();

        for identifier in identifiers {
            if !seen.insert(identifier.clone()) {
                continue;
            }
            if index.contains(&identifier) {
                units.push(WorkUnit {
                    identifier,
                    payload: (),
                });
            } else {
                let _ = tx.send(SyncOutcome::new(
                    identifier.clone(),
                    Err(LibraryError::NotFound(identifier)),
                ));
            }
        }

        let total = seen.len();
        tracing::info!(total, dispatched = units.len(), concurrency, "sync batch started");
        spawn_pool(self.worker.clone(), units, concurrency, cancel.clone(), tx);

        OutcomeStream::new(rx, total)
    }
}

struct SyncWorker {
    store: Arc<dyn LibraryStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl SyncWorker {
    fn persist(&self, identifier: &str, record: Record) -> Result<MergedView, LibraryError> {
        match self.store.replace_record(&record)? {
            RecordReplacement::Replaced(annotation) => Ok(MergedView::new(record, annotation)),
            // deleted while the fetch was in flight
            RecordReplacement::Absent => Err(LibraryError::NotFound(identifier.to_string())),
            RecordReplacement::MissingAnnotation => {
                tracing::warn!(identifier = %identifier, "record has no annotation");
                Err(LibraryError::inconsistency(
                    identifier,
                    "record present but annotation missing",
                ))
            }
        }
    }
}

#[async_trait]
impl BatchWorker for SyncWorker {
    type Payload = ();
    type Outcome = SyncOutcome;

    async fn process(&self, unit: WorkUnit<()>) -> SyncOutcome {
        let identifier = unit.identifier;

        let result = match self.fetcher.fetch_record(&identifier).await {
            Ok(mut record) => {
                record.identifier = identifier.clone();
                self.persist(&identifier, record)
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "refresh fetch failed");
                Err(LibraryError::fetch_failed(identifier.clone(), e))
            }
        };
        if result.is_ok() {
            tracing::debug!(identifier = %identifier, "refreshed");
        }
        SyncOutcome::new(identifier, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::model::{Annotation, AnnotationPatch, Downloadable, Platform};
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct NewBuildFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for NewBuildFetcher {
        async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if identifier == "offline" {
                return Err(FetchError::Network("connection reset".into()));
            }
            Ok(Record::new(identifier, "Fresh")
                .with_downloadable(Downloadable::new("game-2.0-windows.zip", Platform::Windows, "10 MB")))
        }
    }

    fn seeded(store: &MemoryStore, id: &str) {
        store
            .insert_entry(&Record::new(id, "Stale"), &Annotation::new(id))
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_keeps_user_state() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "game");
        store
            .update_annotation(
                "game",
                &AnnotationPatch::default().starred(true).last_played_version("v1.0"),
            )
            .unwrap();
        let orchestrator = SyncOrchestrator::new(store.clone(), Arc::new(NewBuildFetcher::default()));
        let index: ExistenceIndex = ["game"].into_iter().collect();

        let outcomes = orchestrator
            .sync(vec!["game".into()], 3, &index, &CancellationToken::new())
            .collect_all()
            .await;

        let view = outcomes[0].result.as_ref().unwrap();
        assert_eq!(view.display_name(), "Fresh");
        assert!(view.starred());
        assert!(view.has_update());
        assert_eq!(store.load_record("game").unwrap().unwrap().display_name, "Fresh");
    }

    #[tokio::test]
    async fn failed_refresh_leaves_previous_record() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "offline");
        let orchestrator = SyncOrchestrator::new(store.clone(), Arc::new(NewBuildFetcher::default()));
        let index: ExistenceIndex = ["offline"].into_iter().collect();

        let outcomes = orchestrator
            .sync(vec!["offline".into()], 1, &index, &CancellationToken::new())
            .collect_all()
            .await;

        assert!(matches!(outcomes[0].result, Err(LibraryError::FetchFailed { .. })));
        assert_eq!(store.load_record("offline").unwrap().unwrap().display_name, "Stale");
    }

    #[tokio::test]
    async fn unknown_and_repeated_identifiers() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "game");
        let fetcher = Arc::new(NewBuildFetcher::default());
        let orchestrator = SyncOrchestrator::new(store.clone(), fetcher.clone());
        let index: ExistenceIndex = ["game"].into_iter().collect();

        let stream = orchestrator.sync(
            vec!["game".into(), "stranger".into(), "game".into()],
            2,
            &index,
            &CancellationToken::new(),
        );
        assert_eq!(stream.total(), 2);
        let outcomes = stream.collect_all().await;

        assert_eq!(outcomes.len(), 2);
        let stranger = outcomes.iter().find(|o| o.identifier == "stranger").unwrap();
        assert!(matches!(stranger.result, Err(LibraryError::NotFound(_))));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn orphan_record_is_an_inconsistency() {
        let store = Arc::new(MemoryStore::new());
        store.insert_orphan_record(Record::new("orphan", "Orphan"));
        let orchestrator = SyncOrchestrator::new(store.clone(), Arc::new(NewBuildFetcher::default()));
        let index: ExistenceIndex = ["orphan"].into_iter().collect();

        let outcomes = orchestrator
            .sync(vec!["orphan".into()], 1, &index, &CancellationToken::new())
            .collect_all()
            .await;

        assert!(outcomes[0].result.as_ref().unwrap_err().is_inconsistency());
    }

    /// Removes the entry from the store while its fetch is in flight
    struct DeletingFetcher {
        store: Arc<MemoryStore>,
    }

    #[async_trait]
    impl Fetcher for DeletingFetcher {
        async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError> {
            self.store.delete_entry(identifier).unwrap();
            Ok(Record::new(identifier, "Fresh"))
        }
    }

    #[tokio::test]
    async fn delete_during_fetch_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        seeded(&store, "game");
        let fetcher = Arc::new(DeletingFetcher { store: store.clone() });
        let orchestrator = SyncOrchestrator::new(store.clone(), fetcher);
        let index: ExistenceIndex = ["game"].into_iter().collect();

        let outcomes = orchestrator
            .sync(vec!["game".into()], 1, &index, &CancellationToken::new())
            .collect_all()
            .await;

        assert!(matches!(outcomes[0].result, Err(LibraryError::NotFound(_))));
        assert!(store.load_record("game").unwrap().is_none());
        assert!(store.load_annotation("game").unwrap().is_none());
    }
}
