//! Backup format: a JSON array of annotations.
//!
//! Records are not part of a backup. Restoring re-fetches every page and
//! seeds the new annotation from the backup entry.

use crate::model::Annotation;

pub fn to_json(annotations: &[Annotation]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(annotations)
}

/// Parse a backup. Missing optional fields take their defaults.
pub fn from_json(content: &str) -> serde_json::Result<Vec<Annotation>> {
    serde_json::from_str(content)
}
