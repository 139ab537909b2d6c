//! Import orchestrator: bounded-concurrency fetch-and-persist of new identifiers
//!
//! 1. Identifiers already in the existence index report `AlreadyExists`
//!    straight away; no fetch is dispatched for them.
//! 2. The rest go to a worker pool capped at `concurrency` fetches.
//! 3. A successful fetch creates the record and its annotation in one
//!    store call (default annotation, or the one carried by a backup).
//! 4. A failed fetch persists nothing.
//!
//! Every submitted identifier yields exactly one outcome.

use super::cancel::CancellationToken;
use super::error::LibraryError;
use super::index::ExistenceIndex;
use super::outcome::{ImportOutcome, Outcome, OutcomeStream};
use super::pool::{spawn_pool, BatchWorker, WorkUnit};
use crate::fetch::Fetcher;
use crate::model::{Annotation, MergedView};
use crate::storage::LibraryStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives import batches against one store and fetcher
#[derive(Clone)]
pub struct ImportOrchestrator {
    worker: Arc<ImportWorker>,
}

impl ImportOrchestrator {
    pub fn new(store: Arc<dyn LibraryStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            worker: Arc::new(ImportWorker { store, fetcher }),
        }
    }

    /// Import a set of new identifiers with default annotations.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn import(
        &self,
        identifiers: HashSet<String>,
        concurrency: usize,
        index: &ExistenceIndex,
        cancel: &CancellationToken,
    ) -> OutcomeStream<ImportOutcome> {
        let units = identifiers
            .into_iter()
            .map(|identifier| WorkUnit {
                identifier,
                payload: None,
            })
            .collect();
        self.dispatch(units, concurrency, index, cancel)
    }

    /// Import identifiers from a backup, seeding each new item's
    /// annotation from its backup entry instead of the defaults.
    ///
    /// Entries are keyed by identifier; when a backup lists one twice, the
    /// first entry wins.
    pub fn import_from_backup(
        &self,
        annotations: Vec<Annotation>,
        concurrency: usize,
        index: &ExistenceIndex,
        cancel: &CancellationToken,
    ) -> OutcomeStream<ImportOutcome> {
        let mut seen = HashSet::new();
        let units = annotations
            .into_iter()
            .filter(|annotation| seen.insert(annotation.identifier.clone()))
            .map(|annotation| WorkUnit {
                identifier: annotation.identifier.clone(),
                payload: Some(annotation),
            })
            .collect();
        self.dispatch(units, concurrency, index, cancel)
    }

    fn dispatch(
        &self,
        units: Vec<WorkUnit<Option<Annotation>>>,
        concurrency: usize,
        index: &ExistenceIndex,
        cancel: &CancellationToken,
    ) -> OutcomeStream<ImportOutcome> {
        let total = units.len();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut pending = Vec::with_capacity(total);
        for unit in units {
            if index.contains(&unit.identifier) {
                let identifier = unit.identifier;
                tracing::debug!(identifier = %identifier, "skipping, already in library");
                // receiver is alive: it is returned below
                let _ = tx.send(ImportOutcome::new(
                    identifier.clone(),
                    Err(LibraryError::AlreadyExists(identifier)),
                ));
            } else {
                pending.push(unit);
            }
        }

        tracing::info!(
            total,
            dispatched = pending.len(),
            concurrency,
            "import batch started"
        );
        spawn_pool(self.worker.clone(), pending, concurrency, cancel.clone(), tx);

        OutcomeStream::new(rx, total)
    }
}

struct ImportWorker {
    store: Arc<dyn LibraryStore>,
    fetcher: Arc<dyn Fetcher>,
}

#[async_trait]
impl BatchWorker for ImportWorker {
    type Payload = Option<Annotation>;
    type Outcome = ImportOutcome;

    async fn process(&self, unit: WorkUnit<Option<Annotation>>) -> ImportOutcome {
        let WorkUnit {
            identifier,
            payload: seed,
        } = unit;

        let mut record = match self.fetcher.fetch_record(&identifier).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "import fetch failed");
                let error = LibraryError::fetch_failed(identifier.clone(), e);
                return ImportOutcome::new(identifier, Err(error));
            }
        };
        if record.identifier != identifier {
            tracing::debug!(
                identifier = %identifier,
                reported = %record.identifier,
                "fetcher reported a different identifier, keeping the requested one"
            );
            record.identifier = identifier.clone();
        }

        let annotation = match seed {
            Some(mut annotation) => {
                annotation.identifier = identifier.clone();
                annotation
            }
            None => Annotation::new(identifier.clone()),
        };

        let result = match self.store.insert_entry(&record, &annotation) {
            Ok(true) => {
                tracing::debug!(identifier = %identifier, "imported");
                Ok(MergedView::new(record, annotation))
            }
            // another batch stored it while this fetch was in flight
            Ok(false) => Err(LibraryError::AlreadyExists(identifier.clone())),
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "import persist failed");
                Err(LibraryError::from(e))
            }
        };
        ImportOutcome::new(identifier, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::model::Record;
    use crate::storage::MemoryStore;

    struct EchoFetcher;

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError> {
            if identifier.ends_with("broken") {
                return Err(FetchError::Parsing("no title".into()));
            }
            Ok(Record::new(identifier, identifier.to_uppercase()))
        }
    }

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failed_fetch_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = ImportOrchestrator::new(store.clone(), Arc::new(EchoFetcher));

        let outcomes = orchestrator
            .import(ids(&["a/broken"]), 2, &ExistenceIndex::new(), &CancellationToken::new())
            .collect_all()
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0].result,
            Err(LibraryError::FetchFailed { source: FetchError::Parsing(_), .. })
        ));
        assert_eq!(store.count_records().unwrap(), 0);
        assert_eq!(store.count_annotations().unwrap(), 0);
    }

    #[tokio::test]
    async fn indexed_identifier_is_never_fetched() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = ImportOrchestrator::new(store.clone(), Arc::new(EchoFetcher));
        let index: ExistenceIndex = ["known"].into_iter().collect();

        let outcomes = orchestrator
            .import(ids(&["known"]), 2, &index, &CancellationToken::new())
            .collect_all()
            .await;

        assert!(outcomes[0].result.as_ref().unwrap_err().is_duplicate());
        assert_eq!(store.count_records().unwrap(), 0);
    }

    #[tokio::test]
    async fn store_refusal_reports_duplicate() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_entry(&Record::new("raced", "Raced"), &Annotation::new("raced"))
            .unwrap();
        let orchestrator = ImportOrchestrator::new(store.clone(), Arc::new(EchoFetcher));

        // index is stale: the store already holds the record
        let outcomes = orchestrator
            .import(ids(&["raced"]), 1, &ExistenceIndex::new(), &CancellationToken::new())
            .collect_all()
            .await;

        assert!(outcomes[0].result.as_ref().unwrap_err().is_duplicate());
        assert_eq!(store.count_records().unwrap(), 1);
    }

    #[tokio::test]
    async fn backup_seed_keeps_user_state() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = ImportOrchestrator::new(store.clone(), Arc::new(EchoFetcher));
        let seed = Annotation {
            starred: true,
            last_played_version: Some("v1.0".into()),
            ..Annotation::new("seeded")
        };

        let outcomes = orchestrator
            .import_from_backup(
                vec![seed.clone(), Annotation::new("seeded")],
                2,
                &ExistenceIndex::new(),
                &CancellationToken::new(),
            )
            .collect_all()
            .await;

        assert_eq!(outcomes.len(), 1);
        let view = outcomes[0].result.as_ref().unwrap();
        assert!(view.starred());
        assert_eq!(store.load_annotation("seeded").unwrap().unwrap(), seed);
    }
}
