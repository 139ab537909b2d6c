//! Record and library builders shared by the integration tests

use super::ScriptedFetcher;
use chrono::{TimeZone, Utc};
use itchwatch::{Downloadable, Library, LibraryStore, Platform, Preferences, Record};
use std::collections::HashSet;
use std::sync::Arc;

/// `https://dev.itch.io/<slug>`
pub fn page(slug: &str) -> String {
    format!("https://dev.itch.io/{slug}")
}

pub fn pages(slugs: &[&str]) -> HashSet<String> {
    slugs.iter().map(|s| page(s)).collect()
}

/// A record with one Windows build named `<slug>-<version>-win.zip`,
/// updated on the given day of January 2024
pub fn build(identifier: &str, name: &str, version: &str, day: u32) -> Record {
    let slug = identifier.rsplit('/').next().unwrap_or(identifier);
    Record::new(identifier, name)
        .with_updated_at(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap())
        .with_downloadable(Downloadable::new(
            format!("{slug}-{version}-win.zip"),
            Platform::Windows,
            "12 MB",
        ))
}

pub fn open_library(
    store: Arc<dyn LibraryStore>,
    fetcher: Arc<ScriptedFetcher>,
    concurrency: usize,
) -> Library {
    Library::open(store, fetcher, Arc::new(Preferences::with_concurrency(concurrency)))
        .expect("library opens")
}
