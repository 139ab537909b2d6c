//! Read-only projection of a record joined with its annotation

use super::annotation::Annotation;
use super::record::{ClassificationTag, Record, TagCategory};
use super::version::current_version_label;
use chrono::{DateTime, Utc};

/// A `Record` joined with its `Annotation`, plus derived fields.
///
/// Never stored. Rebuilt whenever either half changes, so the derived
/// fields always agree with the pair they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedView {
    record: Record,
    annotation: Annotation,
    version_label: Option<String>,
}

impl MergedView {
    pub fn new(record: Record, annotation: Annotation) -> Self {
        let version_label = current_version_label(&record.downloadables);
        Self {
            record,
            annotation,
            version_label,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.record.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.record.display_name
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn starred(&self) -> bool {
        self.annotation.starred
    }

    /// Version label derived from the downloadables
    pub fn current_version_label(&self) -> Option<&str> {
        self.version_label.as_deref()
    }

    /// True when the user played some version and the page now shows a different one
    pub fn has_update(&self) -> bool {
        match &self.annotation.last_played_version {
            Some(played) => self.version_label.as_deref() != Some(played.as_str()),
            None => false,
        }
    }

    pub fn effective_time(&self) -> DateTime<Utc> {
        self.record.effective_time()
    }

    /// Tags offered by the library filter (platform, tag, language)
    pub fn filter_tags(&self) -> impl Iterator<Item = &ClassificationTag> {
        self.record.classification_tags.iter().filter(|tag| {
            matches!(
                tag.category,
                TagCategory::Platform | TagCategory::NormalTag | TagCategory::Language
            )
        })
    }

    /// Same annotation, refreshed record
    pub fn with_record(&self, record: Record) -> Self {
        Self::new(record, self.annotation.clone())
    }

    /// Same record, updated annotation
    pub fn with_annotation(&self, annotation: Annotation) -> Self {
        Self {
            record: self.record.clone(),
            annotation,
            version_label: self.version_label.clone(),
        }
    }

    pub fn into_parts(self) -> (Record, Annotation) {
        (self.record, self.annotation)
    }
}
