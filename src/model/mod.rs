//! Library data model
//!
//! - **Record**: remote-derived page snapshot, replaced wholesale on refresh
//! - **Annotation**: user-owned state, patched field by field
//! - **MergedView**: the two joined, with the derived update flag

mod annotation;
mod record;
mod version;
mod view;

pub use annotation::{Annotation, AnnotationPatch};
pub use record::{
    ClassificationTag, DevLogEntry, Downloadable, Platform, Rating, Record, TagCategory,
};
pub use version::{current_version_label, version_token};
pub use view::MergedView;
