//! User-owned state attached to a stored record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-owned state, keyed by the same identifier as its record.
///
/// Created once at first import; afterwards only patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub identifier: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub last_played_version: Option<String>,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub starred: bool,
}

impl Annotation {
    /// Default annotation for a freshly imported item: unstarred, never played
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            note: None,
            last_played_version: None,
            last_played_at: None,
            starred: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Apply a patch; only the fields the patch supplies change.
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(note) = &patch.note {
            self.note = Some(note.clone());
        }
        if let Some(version) = &patch.last_played_version {
            self.last_played_version = Some(version.clone());
        }
        if let Some(at) = patch.last_played_at {
            self.last_played_at = Some(at);
        }
        if let Some(starred) = patch.starred {
            self.starred = starred;
        }
    }

    /// Non-mutating variant of [`Annotation::apply`]
    pub fn patched(&self, patch: &AnnotationPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Partial update of an [`Annotation`]. `None` fields leave the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    pub note: Option<String>,
    pub last_played_version: Option<String>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub starred: Option<bool>,
}

impl AnnotationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn last_played_version(mut self, version: impl Into<String>) -> Self {
        self.last_played_version = Some(version.into());
        self
    }

    pub fn last_played_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_played_at = Some(at);
        self
    }

    pub fn starred(mut self, starred: bool) -> Self {
        self.starred = Some(starred);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.note.is_none()
            && self.last_played_version.is_none()
            && self.last_played_at.is_none()
            && self.starred.is_none()
    }
}
