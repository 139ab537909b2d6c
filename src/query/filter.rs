//! Keyword and tag filter for the library view

use crate::model::{ClassificationTag, MergedView};

/// Filter applied before sorting.
///
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    /// Case-insensitive substring of the display name
    pub keyword: Option<String>,
    /// Every listed tag must be on the item
    pub tags: Vec<ClassificationTag>,
}

impl LibraryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_tag(mut self, tag: ClassificationTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.as_deref().map_or(true, str::is_empty) && self.tags.is_empty()
    }

    pub fn matches(&self, view: &MergedView) -> bool {
        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            let name = view.display_name().to_lowercase();
            if !name.contains(&keyword.to_lowercase()) {
                return false;
            }
        }
        self.tags
            .iter()
            .all(|wanted| view.filter_tags().any(|tag| tag == wanted))
    }

    /// Keep the matching views, preserving order
    pub fn apply<'a>(&self, views: impl IntoIterator<Item = &'a MergedView>) -> Vec<MergedView> {
        views.into_iter().filter(|v| self.matches(v)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, Record, TagCategory};

    fn tagged(name: &str, tags: &[ClassificationTag]) -> MergedView {
        let record = tags
            .iter()
            .cloned()
            .fold(Record::new(name, name), Record::with_tag);
        MergedView::new(record, Annotation::new(name))
    }

    #[test]
    fn keyword_ignores_case() {
        let filter = LibraryFilter::new().with_keyword("DUNGEON");
        assert!(filter.matches(&tagged("Tiny Dungeon", &[])));
        assert!(!filter.matches(&tagged("Space Trader", &[])));
    }

    #[test]
    fn all_tags_required() {
        let linux = ClassificationTag::new("Linux", "platform-linux", TagCategory::Platform);
        let puzzle = ClassificationTag::new("Puzzle", "tag-puzzle", TagCategory::NormalTag);
        let both = tagged("both", &[linux.clone(), puzzle.clone()]);
        let one = tagged("one", &[linux.clone()]);

        let filter = LibraryFilter::new().with_tag(linux).with_tag(puzzle);
        let kept = filter.apply([&both, &one]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].identifier(), "both");
    }

    #[test]
    fn author_tags_are_not_filterable() {
        let author = ClassificationTag::new("dev", "https://dev.itch.io", TagCategory::Author);
        let view = tagged("x", &[author.clone()]);
        assert!(!LibraryFilter::new().with_tag(author).matches(&view));
        assert!(LibraryFilter::new().is_empty());
    }
}
