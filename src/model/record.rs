//! Remote-derived snapshot of one tracked game page

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Platforms a page can list builds for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Ios,
    Android,
    Web,
    Unknown,
}

impl Platform {
    /// Match a platform label as it appears on a page ("Windows", "HTML5",
    /// "Play in browser", ...). Matching is case-insensitive and substring based.
    pub fn from_label(label: &str) -> Self {
        const LABELS: [(&str, Platform); 7] = [
            ("windows", Platform::Windows),
            ("linux", Platform::Linux),
            ("macos", Platform::MacOs),
            ("ios", Platform::Ios),
            ("android", Platform::Android),
            ("browser", Platform::Web),
            ("html", Platform::Web),
        ];
        let label = label.to_lowercase();
        LABELS
            .iter()
            .find(|(needle, _)| label.contains(needle))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Unknown)
    }
}

/// A downloadable file listed on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downloadable {
    /// File name as shown on the page
    pub name: String,
    pub platform: Platform,
    /// Human-readable size ("35 MB")
    pub size: String,
}

impl Downloadable {
    pub fn new(name: impl Into<String>, platform: Platform, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform,
            size: size.into(),
        }
    }
}

/// One devlog post linked from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevLogEntry {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// Kind of a classification tag row on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    Status,
    Platform,
    Author,
    MadeWith,
    NormalTag,
    Duration,
    Language,
    Input,
    Category,
    Genre,
    Link,
}

/// A classification tag (genre, platform, language, author link, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassificationTag {
    pub display_name: String,
    pub key: String,
    pub category: TagCategory,
}

impl ClassificationTag {
    pub fn new(display_name: impl Into<String>, key: impl Into<String>, category: TagCategory) -> Self {
        Self {
            display_name: display_name.into(),
            key: key.into(),
            category,
        }
    }

    /// Build a tag from its link on the page.
    ///
    /// Link and author tags are keyed by the whole link; every other
    /// category is keyed by the last path segment (`tag-pixel-art` for
    /// `https://itch.io/games/tag-pixel-art`).
    pub fn from_href(display_name: impl Into<String>, href: &str, category: TagCategory) -> Self {
        let key = match category {
            TagCategory::Link | TagCategory::Author => href.to_string(),
            _ => href.rsplit('/').next().unwrap_or(href).to_string(),
        };
        Self::new(display_name, key, category)
    }
}

/// Aggregate rating shown on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: String,
    pub count: u32,
}

/// Remote-derived snapshot of one tracked item.
///
/// Replaced wholesale on refresh; `identifier` never changes once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: String,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<Rating>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub platforms: BTreeSet<Platform>,
    pub downloadables: Vec<Downloadable>,
    pub dev_log_entries: Vec<DevLogEntry>,
    pub classification_tags: Vec<ClassificationTag>,
}

impl Record {
    /// Create a record with only the required fields set
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            icon_url: None,
            image_url: None,
            description: None,
            rating: None,
            updated_at: None,
            published_at: None,
            platforms: BTreeSet::new(),
            downloadables: Vec::new(),
            dev_log_entries: Vec::new(),
            classification_tags: Vec::new(),
        }
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Add a downloadable; its platform is added to `platforms` as well
    pub fn with_downloadable(mut self, file: Downloadable) -> Self {
        self.platforms.insert(file.platform);
        self.downloadables.push(file);
        self
    }

    pub fn with_dev_log(mut self, entry: DevLogEntry) -> Self {
        self.dev_log_entries.push(entry);
        self
    }

    pub fn with_tag(mut self, tag: ClassificationTag) -> Self {
        self.classification_tags.push(tag);
        self
    }

    /// Timestamp used by the time-based sort.
    ///
    /// `updated_at`, else the newest devlog post, else `published_at`,
    /// else the minimum representable instant.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.updated_at
            .or_else(|| self.dev_log_entries.iter().map(|e| e.published_at).max())
            .or(self.published_at)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, day, 12, 0, 0).unwrap()
    }

    fn devlog(day: u32) -> DevLogEntry {
        DevLogEntry {
            title: format!("post {day}"),
            link: format!("https://dev.itch.io/game/devlog/{day}"),
            published_at: at(day),
        }
    }

    #[test]
    fn platform_labels_match_case_insensitively() {
        assert_eq!(Platform::from_label("Windows"), Platform::Windows);
        assert_eq!(Platform::from_label("Play in browser"), Platform::Web);
        assert_eq!(Platform::from_label("HTML5"), Platform::Web);
        assert_eq!(Platform::from_label("macOS"), Platform::MacOs);
        assert_eq!(Platform::from_label("Amiga"), Platform::Unknown);
    }

    #[test]
    fn tag_key_from_href() {
        let genre = ClassificationTag::from_href("Puzzle", "https://itch.io/games/genre-puzzle", TagCategory::Genre);
        assert_eq!(genre.key, "genre-puzzle");

        let author = ClassificationTag::from_href("someone", "https://someone.itch.io", TagCategory::Author);
        assert_eq!(author.key, "https://someone.itch.io");
    }

    #[test]
    fn effective_time_prefers_updated() {
        let record = Record::new("a", "A")
            .with_updated_at(at(3))
            .with_published_at(at(1))
            .with_dev_log(devlog(9));
        assert_eq!(record.effective_time(), at(3));
    }

    #[test]
    fn effective_time_uses_newest_devlog_then_published() {
        let record = Record::new("a", "A")
            .with_published_at(at(1))
            .with_dev_log(devlog(4))
            .with_dev_log(devlog(7));
        assert_eq!(record.effective_time(), at(7));

        let record = Record::new("b", "B").with_published_at(at(1));
        assert_eq!(record.effective_time(), at(1));

        let record = Record::new("c", "C");
        assert_eq!(record.effective_time(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn downloadable_adds_platform() {
        let record = Record::new("a", "A").with_downloadable(Downloadable::new("a.apk", Platform::Android, "10 MB"));
        assert!(record.platforms.contains(&Platform::Android));
    }
}
