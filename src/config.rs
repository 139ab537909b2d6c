//! User preferences the engine reads
//!
//! Fetch concurrency is published on a `watch` channel so a settings
//! screen can change it while batches run. Each batch reads the value once
//! when it is submitted; a change applies from the next batch on.

use crate::query::SortKeys;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Fetch concurrency used when nothing else is configured
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Upper bound accepted for fetch concurrency
pub const MAX_FETCH_CONCURRENCY: usize = 32;

#[derive(Debug)]
pub struct Preferences {
    concurrency: watch::Sender<usize>,
    sort_keys: Mutex<SortKeys>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::with_concurrency(DEFAULT_FETCH_CONCURRENCY)
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(level: usize) -> Self {
        let (concurrency, _) = watch::channel(clamp(level));
        Self {
            concurrency,
            sort_keys: Mutex::new(SortKeys::default()),
        }
    }

    /// Current fetch concurrency
    pub fn concurrency(&self) -> usize {
        *self.concurrency.borrow()
    }

    /// Change the fetch concurrency, clamped to `1..=MAX_FETCH_CONCURRENCY`.
    ///
    /// Returns the value actually stored.
    pub fn set_concurrency(&self, level: usize) -> usize {
        let level = clamp(level);
        self.concurrency.send_replace(level);
        tracing::debug!(concurrency = level, "fetch concurrency changed");
        level
    }

    /// Stream of concurrency values, starting with the current one
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.concurrency.subscribe()
    }

    pub fn sort_keys(&self) -> SortKeys {
        self.sort_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_sort_keys(&self, keys: SortKeys) {
        *self.sort_keys.lock().unwrap_or_else(PoisonError::into_inner) = keys;
    }
}

fn clamp(level: usize) -> usize {
    level.clamp(1, MAX_FETCH_CONCURRENCY)
}
