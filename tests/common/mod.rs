//! Common test utilities for library integration tests
//!
//! Provides a scripted fetcher and builders for records and libraries.

#![allow(dead_code)]

pub mod fetcher;
pub mod fixtures;

pub use fetcher::ScriptedFetcher;
pub use fixtures::{build, open_library, page, pages};
