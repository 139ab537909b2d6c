//! Scripted page fetcher for integration tests
//!
//! Unscripted identifiers succeed with a record named after the
//! identifier. Individual identifiers can be given a canned record or a
//! canned error, and the whole fetcher can be paused so that tests can
//! act while fetches are in flight.

use async_trait::async_trait;
use dashmap::DashMap;
use itchwatch::{FetchError, Fetcher, Record};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
enum Script {
    Respond(Record),
    Fail(FetchError),
    Panic,
}

pub struct ScriptedFetcher {
    scripts: DashMap<String, Script>,
    delay: Option<Duration>,
    paused: AtomicBool,
    gate: Semaphore,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: DashMap::new(),
            delay: None,
            paused: AtomicBool::new(false),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Every fetch sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, identifier: &str, record: Record) {
        self.scripts.insert(identifier.to_string(), Script::Respond(record));
    }

    pub fn fail(&self, identifier: &str, error: FetchError) {
        self.scripts.insert(identifier.to_string(), Script::Fail(error));
    }

    /// Make the fetch for `identifier` panic, like a parser bug would
    pub fn panic_on(&self, identifier: &str) {
        self.scripts.insert(identifier.to_string(), Script::Panic);
    }

    /// Hold every fetch that starts from now on until `resume`
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.gate.add_permits(1024);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` fetches have started
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("fetches did not start in time");
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_record(&self, identifier: &str) -> Result<Record, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if self.paused.load(Ordering::SeqCst) {
            self.gate.acquire().await.expect("gate open").forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = match self.scripts.get(identifier).map(|s| s.value().clone()) {
            Some(Script::Respond(record)) => Ok(record),
            Some(Script::Fail(error)) => Err(error),
            Some(Script::Panic) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("scripted panic for {identifier}");
            }
            None => Ok(Record::new(identifier, identifier)),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}
