//! In-process storage backend
//!
//! One map slot per identifier holds both halves of the pair, so the
//! per-key lock DashMap takes on `entry()`/`get_mut()` makes pair
//! creation, replacement, and deletion atomic for that identifier.

use super::traits::{EntryRemoval, LibraryStore, RecordReplacement, StorageResult};
use crate::model::{Annotation, AnnotationPatch, Record};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Default)]
struct Slot {
    record: Option<Record>,
    annotation: Option<Annotation>,
}

/// DashMap-backed library store, nothing persisted
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an annotation with no record behind it.
    ///
    /// Only useful for reproducing a diverged store in tests and repairs.
    pub fn insert_orphan_annotation(&self, annotation: Annotation) {
        let key = annotation.identifier.clone();
        self.slots.entry(key).or_default().annotation = Some(annotation);
    }

    /// Store a record with no annotation behind it.
    pub fn insert_orphan_record(&self, record: Record) {
        let key = record.identifier.clone();
        self.slots.entry(key).or_default().record = Some(record);
    }
}

impl LibraryStore for MemoryStore {
    fn load_record(&self, identifier: &str) -> StorageResult<Option<Record>> {
        Ok(self.slots.get(identifier).and_then(|s| s.record.clone()))
    }

    fn load_records(&self) -> StorageResult<Vec<Record>> {
        Ok(self.slots.iter().filter_map(|s| s.record.clone()).collect())
    }

    fn contains_record(&self, identifier: &str) -> StorageResult<bool> {
        Ok(self
            .slots
            .get(identifier)
            .map(|s| s.record.is_some())
            .unwrap_or(false))
    }

    fn replace_record(&self, record: &Record) -> StorageResult<RecordReplacement> {
        let Some(mut slot) = self.slots.get_mut(&record.identifier) else {
            return Ok(RecordReplacement::Absent);
        };
        if slot.record.is_none() {
            return Ok(RecordReplacement::Absent);
        }
        slot.record = Some(record.clone());
        Ok(match &slot.annotation {
            Some(annotation) => RecordReplacement::Replaced(annotation.clone()),
            None => RecordReplacement::MissingAnnotation,
        })
    }

    fn count_records(&self) -> StorageResult<usize> {
        Ok(self.slots.iter().filter(|s| s.record.is_some()).count())
    }

    fn load_annotation(&self, identifier: &str) -> StorageResult<Option<Annotation>> {
        Ok(self.slots.get(identifier).and_then(|s| s.annotation.clone()))
    }

    fn load_annotations(&self) -> StorageResult<Vec<Annotation>> {
        Ok(self.slots.iter().filter_map(|s| s.annotation.clone()).collect())
    }

    fn update_annotation(
        &self,
        identifier: &str,
        patch: &AnnotationPatch,
    ) -> StorageResult<Option<Annotation>> {
        let Some(mut slot) = self.slots.get_mut(identifier) else {
            return Ok(None);
        };
        Ok(slot.annotation.as_mut().map(|annotation| {
            annotation.apply(patch);
            annotation.clone()
        }))
    }

    fn count_annotations(&self) -> StorageResult<usize> {
        Ok(self.slots.iter().filter(|s| s.annotation.is_some()).count())
    }

    fn insert_entry(&self, record: &Record, annotation: &Annotation) -> StorageResult<bool> {
        match self.slots.entry(record.identifier.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().record.is_some() {
                    return Ok(false);
                }
                let slot = occupied.get_mut();
                slot.record = Some(record.clone());
                slot.annotation = Some(annotation.clone());
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot {
                    record: Some(record.clone()),
                    annotation: Some(annotation.clone()),
                });
            }
        }
        Ok(true)
    }

    fn delete_entry(&self, identifier: &str) -> StorageResult<EntryRemoval> {
        Ok(self
            .slots
            .remove(identifier)
            .map(|(_, slot)| EntryRemoval {
                record_removed: slot.record.is_some(),
                annotation_removed: slot.annotation.is_some(),
            })
            .unwrap_or_default())
    }
}
