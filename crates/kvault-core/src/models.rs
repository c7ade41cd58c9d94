//! Data models for KnowledgeVault
//!
//! Defines the core data structures: `Record` (one stored row), `NewRecord`
//! (a candidate handed to the store for insertion), `RecordUpdate` (a partial
//! edit) and the fixed `Category` set.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::schema::Column;

/// Timestamp format used for `date_added`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source tag for records added by hand
pub const SOURCE_MANUAL: &str = "manual";

/// Source tag for records brought in through a file import
pub const SOURCE_IMPORT: &str = "import";

/// Kind of learning resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Book,
    YouTube,
    Article,
    Course,
    ResearchPaper,
    #[default]
    Other,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Category::Book,
        Category::YouTube,
        Category::Article,
        Category::Course,
        Category::ResearchPaper,
        Category::Other,
    ];

    /// The label written to disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Book => "Book",
            Category::YouTube => "YouTube",
            Category::Article => "Article",
            Category::Course => "Course",
            Category::ResearchPaper => "Research Paper",
            Category::Other => "Other",
        }
    }

    /// Parse a stored label, falling back to `Other` for blank or unknown values
    pub fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a label names no known category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of: Book, YouTube, Article, Course, Research Paper, Other)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(wanted)
                    || c.as_str().replace(' ', "-").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Category::parse_lenient(&label))
    }
}

/// One knowledge item, exactly as persisted
///
/// Field order matches the on-disk column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier; `None` when the stored value was missing or not numeric
    pub id: Option<u64>,
    pub title: String,
    pub category: Category,
    /// URL, may be empty
    pub link: String,
    pub notes: String,
    /// Comma-separated free-text tags
    pub tags: String,
    /// Provenance: "manual", "import" or the name of a fetcher
    pub source: String,
    /// Creation time formatted with [`DATE_FORMAT`]; never rewritten by updates
    pub date_added: String,
}

impl Record {
    /// An empty row with every column blank
    pub fn blank() -> Self {
        Self {
            id: None,
            title: String::new(),
            category: Category::Other,
            link: String::new(),
            notes: String::new(),
            tags: String::new(),
            source: String::new(),
            date_added: String::new(),
        }
    }

    /// The key used for duplicate detection
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.link)
    }

    /// Parsed `date_added`, if it holds a recognizable timestamp
    pub fn added_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date_added)
    }

    /// Iterate over the individual tags
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Text value of a single column
    pub fn value(&self, column: Column) -> String {
        match column {
            Column::Id => self.id.map(|id| id.to_string()).unwrap_or_default(),
            Column::Title => self.title.clone(),
            Column::Category => self.category.as_str().to_string(),
            Column::Link => self.link.clone(),
            Column::Notes => self.notes.clone(),
            Column::Tags => self.tags.clone(),
            Column::Source => self.source.clone(),
            Column::DateAdded => self.date_added.clone(),
        }
    }
}

/// Case-insensitive, whitespace-trimmed (title, link) pair
///
/// Empty titles and links are ordinary values: two rows that both have an
/// empty title and an empty link share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    link: String,
}

impl DedupKey {
    pub fn new(title: &str, link: &str) -> Self {
        Self {
            title: title.trim().to_lowercase(),
            link: link.trim().to_lowercase(),
        }
    }
}

/// A record proposed for insertion
///
/// The store assigns the id and the `date_added` stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: String,
    /// Defaults to "manual" when absent or blank
    #[serde(default)]
    pub source: Option<String>,
}

impl NewRecord {
    /// Create a candidate with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The key used for duplicate detection
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, &self.link)
    }

    /// Build a candidate from an existing row, for re-ingestion during imports
    pub(crate) fn from_imported(record: Record) -> Self {
        let source = if record.source.trim().is_empty() {
            SOURCE_IMPORT.to_string()
        } else {
            record.source
        };
        Self {
            title: record.title,
            category: record.category,
            link: record.link,
            notes: record.notes,
            tags: record.tags,
            source: Some(source),
        }
    }
}

/// Partial edit of a record
///
/// Only the fields set to `Some` are written. `id` and `date_added` have no
/// counterpart here and therefore can never be changed through an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub source: Option<String>,
}

impl RecordUpdate {
    /// Build an update from loosely typed (column name, value) pairs
    ///
    /// Unknown names are ignored, as are `id` and `date_added`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut update = Self::default();
        for (name, value) in pairs {
            let value = value.into();
            match Column::from_name(name.as_ref()) {
                Some(Column::Title) => update.title = Some(value),
                Some(Column::Category) => update.category = Some(Category::parse_lenient(&value)),
                Some(Column::Link) => update.link = Some(value),
                Some(Column::Notes) => update.notes = Some(value),
                Some(Column::Tags) => update.tags = Some(value),
                Some(Column::Source) => update.source = Some(value),
                Some(Column::Id) | Some(Column::DateAdded) | None => {}
            }
        }
        update
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Write the set fields onto `record`
    pub fn apply(&self, record: &mut Record) {
        if let Some(ref title) = self.title {
            record.title = title.clone();
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(ref link) = self.link {
            record.link = link.clone();
        }
        if let Some(ref notes) = self.notes {
            record.notes = notes.clone();
        }
        if let Some(ref tags) = self.tags {
            record.tags = tags.clone();
        }
        if let Some(ref source) = self.source {
            record.source = source.clone();
        }
    }
}

/// Parse a stored timestamp
///
/// Accepts the canonical format, an ISO `T` separator, or a bare date.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
