//! Composite sort engine
//!
//! Active keys are applied in a fixed order (Starred, Updated,
//! TimeReverse, Name) no matter the order they were switched on. Each
//! stage only breaks ties left by the previous one, and the sort is
//! stable, so items no active key distinguishes keep their input order.

use crate::model::MergedView;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// One sort criterion. Declaration order is application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Starred items first
    Starred,
    /// Items with an unplayed new version first
    Updated,
    /// Most recent effective time first
    TimeReverse,
    /// Display name ascending
    Name,
}

impl SortKey {
    fn compare(self, a: &MergedView, b: &MergedView) -> Ordering {
        match self {
            SortKey::Starred => b.starred().cmp(&a.starred()),
            SortKey::Updated => b.has_update().cmp(&a.has_update()),
            SortKey::TimeReverse => b.effective_time().cmp(&a.effective_time()),
            SortKey::Name => compare_names(a.display_name(), b.display_name()),
        }
    }
}

/// Case-insensitive first, then plain code-point order so that names
/// differing only in case still sort deterministically.
fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// The set of active sort keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeys(BTreeSet<SortKey>);

impl Default for SortKeys {
    fn default() -> Self {
        Self::from_iter([SortKey::Name])
    }
}

impl SortKeys {
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, key: SortKey) -> bool {
        self.0.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = SortKey> + '_ {
        self.0.iter().copied()
    }

    /// Apply a UI toggle.
    ///
    /// `Name` and `TimeReverse` are exclusive: choosing one switches the
    /// other off and leaves the chosen key on. Other keys flip.
    pub fn toggle(&mut self, key: SortKey) {
        match key {
            SortKey::Name => {
                self.0.remove(&SortKey::TimeReverse);
                self.0.insert(SortKey::Name);
            }
            SortKey::TimeReverse => {
                self.0.remove(&SortKey::Name);
                self.0.insert(SortKey::TimeReverse);
            }
            other => {
                if !self.0.remove(&other) {
                    self.0.insert(other);
                }
            }
        }
    }
}

impl FromIterator<SortKey> for SortKeys {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Sort a list of views by the active keys. Pure and stable.
pub fn sort(mut items: Vec<MergedView>, keys: &SortKeys) -> Vec<MergedView> {
    if keys.0.is_empty() {
        return items;
    }
    items.sort_by(|a, b| {
        keys.iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    items
}
