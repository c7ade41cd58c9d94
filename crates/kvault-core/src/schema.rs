//! Record schema and normalization
//!
//! Every collection that enters the store, whether read from disk, decoded
//! from an import file or built by a caller, passes through [`normalize`].
//! Normalization keeps exactly the declared columns in declared order, fills
//! missing ones with empty text, drops unknown ones, and coerces `id` to a
//! number or unset.

use std::collections::BTreeMap;

use crate::collection::{Collection, MAX_ID};
use crate::models::{Category, Record};

/// A loosely typed row: column name -> text
pub type RawRecord = BTreeMap<String, String>;

/// Column names in declared order
pub const COLUMNS: [&str; 8] = [
    "id",
    "title",
    "category",
    "link",
    "notes",
    "tags",
    "source",
    "date_added",
];

/// A declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Title,
    Category,
    Link,
    Notes,
    Tags,
    Source,
    DateAdded,
}

impl Column {
    /// Every column, in declared order
    pub const ALL: [Column; 8] = [
        Column::Id,
        Column::Title,
        Column::Category,
        Column::Link,
        Column::Notes,
        Column::Tags,
        Column::Source,
        Column::DateAdded,
    ];

    pub fn name(self) -> &'static str {
        COLUMNS[self as usize]
    }

    /// Look up a column by header name
    ///
    /// Surrounding whitespace, a UTF-8 byte order mark and letter case are ignored.
    pub fn from_name(name: &str) -> Option<Column> {
        let name = name.trim_start_matches('\u{feff}').trim();
        Column::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// Coerce a stored id to a positive integer
///
/// Blank, non-numeric, fractional, zero and negative values become `None`,
/// as does anything above [`MAX_ID`]. Whole floats such as `"3.0"` are
/// accepted.
pub fn coerce_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(id) = raw.parse::<u64>() {
        return (1..=MAX_ID).contains(&id).then_some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= MAX_ID as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Normalize a single raw row into a `Record`
pub fn normalize_row(raw: &RawRecord) -> Record {
    let mut record = Record::blank();
    for (name, value) in raw {
        let Some(column) = Column::from_name(name) else {
            continue;
        };
        match column {
            Column::Id => record.id = coerce_id(value),
            Column::Title => record.title = value.clone(),
            Column::Category => record.category = Category::parse_lenient(value),
            Column::Link => record.link = value.clone(),
            Column::Notes => record.notes = value.clone(),
            Column::Tags => record.tags = value.clone(),
            Column::Source => record.source = value.clone(),
            Column::DateAdded => record.date_added = value.clone(),
        }
    }
    record
}

/// Normalize raw rows into a collection, preserving row order
pub fn normalize<I>(rows: I) -> Collection
where
    I: IntoIterator<Item = RawRecord>,
{
    rows.into_iter().map(|row| normalize_row(&row)).collect()
}

impl Record {
    /// The record as a raw row holding exactly the declared columns
    pub fn to_raw(&self) -> RawRecord {
        Column::ALL
            .into_iter()
            .map(|c| (c.name().to_string(), self.value(c)))
            .collect()
    }

    /// Column values in declared order
    pub fn to_row(&self) -> [String; 8] {
        Column::ALL.map(|c| self.value(c))
    }
}
