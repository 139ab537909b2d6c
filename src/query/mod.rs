//! Ordering and filtering of the library view
//!
//! Both operate on `MergedView` snapshots and never touch storage.

mod filter;
mod sort;

pub use filter::LibraryFilter;
pub use sort::{sort, SortKey, SortKeys};
