//! In-memory record collection
//!
//! A `Collection` is a snapshot of every record at a point in time. All
//! record-level operations (id assignment, duplicate detection, add, update,
//! delete) are defined here as transforms on a caller-owned snapshot; nothing
//! is written to disk until the caller saves.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{NewRecord, Record, RecordUpdate, DATE_FORMAT, SOURCE_MANUAL};

/// Largest id the store hands out or reads back
///
/// The largest integer an `f64` holds exactly, so ids survive spreadsheet and
/// JSON round trips unchanged.
pub const MAX_ID: u64 = (1 << 53) - 1;

/// Result of adding a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The candidate was appended with this id
    Added(u64),
    /// A record with the same title and link already exists; nothing changed
    Duplicate,
    /// Every id up to [`MAX_ID`] has been used; nothing changed
    IdsExhausted,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }
}

/// Ordered set of records
///
/// Besides the rows, a collection remembers the highest id it has ever
/// handed out, so deleting the newest record does not free its id. Equality
/// compares rows only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Record>,
    #[serde(skip)]
    high_water: u64,
}

impl Collection {
    /// An empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            high_water: 0,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Highest id ever used: the largest present id or the remembered
    /// high-water mark, whichever is greater; 0 for a fresh collection
    pub fn last_id(&self) -> u64 {
        self.records
            .iter()
            .filter_map(|r| r.id)
            .max()
            .unwrap_or(0)
            .max(self.high_water)
    }

    /// Remember that ids up to `id` have been used
    ///
    /// Never lowers the mark. Used when loading the mark saved alongside the
    /// record file.
    pub fn raise_last_id(&mut self, id: u64) {
        self.high_water = self.high_water.max(id.min(MAX_ID));
    }

    /// Forget every id that is no longer present
    ///
    /// Only explicit relabelling and clearing the store may do this.
    pub(crate) fn reset_last_id(&mut self) {
        self.high_water = 0;
    }

    /// Pin the mark before rows are removed
    pub(crate) fn hold_last_id(&mut self) {
        self.high_water = self.last_id();
    }

    /// The id the next added record will receive
    ///
    /// One past [`Collection::last_id`], so ids freed by deletion are never
    /// reused. `None` once [`MAX_ID`] has been handed out.
    pub fn next_id(&self) -> Option<u64> {
        self.last_id().checked_add(1).filter(|id| *id <= MAX_ID)
    }

    /// Whether a record with the candidate's title and link already exists
    pub fn is_duplicate(&self, candidate: &NewRecord) -> bool {
        let key = candidate.dedup_key();
        self.records.iter().any(|r| r.dedup_key() == key)
    }

    /// First record with the given id
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == Some(id))
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Add a candidate, stamping it with the current local time
    ///
    /// A candidate whose title and link match an existing record is ignored.
    pub fn add(&mut self, candidate: NewRecord) -> AddOutcome {
        self.add_at(candidate, Local::now().naive_local())
    }

    /// Add a candidate with an explicit `date_added`
    pub fn add_at(&mut self, candidate: NewRecord, now: NaiveDateTime) -> AddOutcome {
        if self.is_duplicate(&candidate) {
            return AddOutcome::Duplicate;
        }

        let Some(id) = self.next_id() else {
            warn!(last_id = self.last_id(), "No ids left, record not added");
            return AddOutcome::IdsExhausted;
        };
        self.high_water = id;
        let source = candidate
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| SOURCE_MANUAL.to_string());

        self.records.push(Record {
            id: Some(id),
            title: candidate.title.trim().to_string(),
            category: candidate.category,
            link: candidate.link.trim().to_string(),
            notes: candidate.notes.trim().to_string(),
            tags: candidate.tags.trim().to_string(),
            source,
            date_added: now.format(DATE_FORMAT).to_string(),
        });

        AddOutcome::Added(id)
    }

    /// Apply `update` to every record with the given id
    ///
    /// Returns the number of records touched; zero when the id is absent.
    pub fn update(&mut self, id: u64, update: &RecordUpdate) -> usize {
        let mut touched = 0;
        for record in self.records.iter_mut().filter(|r| r.id == Some(id)) {
            update.apply(record);
            touched += 1;
        }
        touched
    }

    /// Remove every record with the given id
    ///
    /// Returns the number of records removed.
    pub fn delete(&mut self, id: u64) -> usize {
        self.hold_last_id();
        let before = self.records.len();
        self.records.retain(|r| r.id != Some(id));
        before - self.records.len()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for Collection {}

impl FromIterator<Record> for Collection {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn record(id: Option<u64>, title: &str, link: &str) -> Record {
        Record {
            id,
            title: title.to_string(),
            link: link.to_string(),
            ..Record::blank()
        }
    }

    #[test]
    fn test_next_id_empty() {
        assert_eq!(Collection::new().next_id(), Some(1));
    }

    #[test]
    fn test_next_id_ignores_unset_ids() {
        let collection = Collection::from_records(vec![record(None, "a", ""), record(None, "b", "")]);
        assert_eq!(collection.next_id(), Some(1));

        let collection =
            Collection::from_records(vec![record(Some(3), "a", ""), record(None, "b", "")]);
        assert_eq!(collection.next_id(), Some(4));
    }

    #[test]
    fn test_next_id_is_never_present() {
        let collection = Collection::from_records(vec![
            record(Some(7), "a", ""),
            record(Some(2), "b", ""),
            record(None, "c", ""),
        ]);
        let next = collection.next_id().unwrap();
        assert!(!collection.contains_id(next));
        assert_eq!(next, 8);
    }

    #[test]
    fn test_raised_last_id_is_not_reused() {
        let mut collection = Collection::from_records(vec![record(Some(2), "a", "")]);
        collection.raise_last_id(9);
        collection.raise_last_id(4);
        assert_eq!(collection.last_id(), 9);
        assert_eq!(collection.add(NewRecord::new("b")), AddOutcome::Added(10));
    }

    #[test]
    fn test_add_after_largest_id_is_refused() {
        let mut collection = Collection::from_records(vec![record(Some(u64::MAX), "Huge", "")]);
        assert_eq!(collection.next_id(), None);
        assert_eq!(collection.add(NewRecord::new("one more")), AddOutcome::IdsExhausted);
        assert_eq!(collection.len(), 1);

        let mut collection = Collection::from_records(vec![record(Some(MAX_ID - 1), "a", "")]);
        assert_eq!(collection.add(NewRecord::new("b")), AddOutcome::Added(MAX_ID));
        assert_eq!(collection.add(NewRecord::new("c")), AddOutcome::IdsExhausted);
    }

    #[test]
    fn test_equality_ignores_last_id() {
        let mut added = Collection::new();
        added.add_at(
            NewRecord::new("a"),
            NaiveDateTime::parse_from_str("2024-03-05 14:07:09", DATE_FORMAT).unwrap(),
        );
        let mut loaded = Collection::from_records(added.records().to_vec());
        loaded.raise_last_id(40);
        assert_eq!(added, loaded);
    }

    #[test]
    fn test_add_to_empty_store() {
        let mut collection = Collection::new();
        let outcome = collection.add(
            NewRecord::new("SQL Basics")
                .with_link("http://x")
                .with_category(Category::Book),
        );
        assert_eq!(outcome, AddOutcome::Added(1));
        assert_eq!(collection.len(), 1);

        let added = collection.get(1).unwrap();
        assert_eq!(added.category, Category::Book);
        assert_eq!(added.source, "manual");
        assert!(added.added_at().is_some());
    }

    #[test]
    fn test_add_same_title_and_link_is_noop() {
        let mut collection = Collection::new();
        collection.add(NewRecord::new("SQL Basics").with_link("http://x"));

        let outcome = collection.add(
            NewRecord::new("  sql basics ")
                .with_link("HTTP://X")
                .with_category(Category::Course)
                .with_tags("different"),
        );
        assert_eq!(outcome, AddOutcome::Duplicate);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_double_add_has_same_length_as_single_add() {
        let candidates = [
            NewRecord::new("A").with_link("l"),
            NewRecord::new(""),
            NewRecord::new(" padded ").with_notes("n"),
        ];
        for candidate in candidates {
            let mut once = Collection::new();
            once.add(candidate.clone());
            let mut twice = once.clone();
            twice.add(candidate);
            assert_eq!(once.len(), twice.len());
        }
    }

    #[test]
    fn test_add_trims_fields_and_keeps_source() {
        let mut collection = Collection::new();
        collection.add(
            NewRecord::new("  Title  ")
                .with_link(" https://example.com ")
                .with_notes("  note ")
                .with_tags(" a, b ")
                .with_source("google_books"),
        );
        let added = &collection.records()[0];
        assert_eq!(added.title, "Title");
        assert_eq!(added.link, "https://example.com");
        assert_eq!(added.notes, "note");
        assert_eq!(added.tags, "a, b");
        assert_eq!(added.source, "google_books");
    }

    #[test]
    fn test_add_at_stamps_given_time() {
        let now = NaiveDateTime::parse_from_str("2024-03-05 14:07:09", DATE_FORMAT).unwrap();
        let mut collection = Collection::new();
        collection.add_at(NewRecord::new("T"), now);
        assert_eq!(collection.records()[0].date_added, "2024-03-05 14:07:09");
    }

    #[test]
    fn test_empty_title_and_link_are_duplicates() {
        let mut collection = Collection::new();
        assert!(collection.add(NewRecord::new("")).is_added());
        assert!(collection.is_duplicate(&NewRecord::new("  ")));
        assert_eq!(collection.add(NewRecord::new("")), AddOutcome::Duplicate);
    }

    #[test]
    fn test_delete_then_add_does_not_reuse_id() {
        let mut collection = Collection::new();
        for title in ["a", "b", "c"] {
            collection.add(NewRecord::new(title));
        }
        assert_eq!(collection.delete(3), 1);
        assert_eq!(collection.add(NewRecord::new("d")), AddOutcome::Added(4));
    }

    #[test]
    fn test_delete_newest_loaded_record_does_not_free_its_id() {
        let mut collection = Collection::from_records(vec![
            record(Some(1), "a", ""),
            record(Some(2), "b", ""),
        ]);
        collection.delete(2);
        assert_eq!(collection.last_id(), 2);
        assert_eq!(collection.add(NewRecord::new("c")), AddOutcome::Added(3));
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let mut collection = Collection::from_records(vec![record(Some(1), "a", "")]);
        assert_eq!(collection.delete(42), 0);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_update_changes_named_fields_only() {
        let mut collection = Collection::new();
        collection.add(NewRecord::new("Old").with_link("http://old").with_notes("keep"));
        let stamp = collection.records()[0].date_added.clone();

        let update = RecordUpdate {
            title: Some("New".to_string()),
            category: Some(Category::Article),
            ..RecordUpdate::default()
        };
        assert_eq!(collection.update(1, &update), 1);

        let updated = collection.get(1).unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.category, Category::Article);
        assert_eq!(updated.link, "http://old");
        assert_eq!(updated.notes, "keep");
        assert_eq!(updated.date_added, stamp);
    }

    #[test]
    fn test_update_missing_or_empty_is_noop() {
        let update = RecordUpdate::from_pairs([("title", "x")]);

        let mut empty = Collection::new();
        assert_eq!(empty.update(1, &update), 0);

        let mut collection = Collection::from_records(vec![record(Some(1), "a", "")]);
        let before = collection.clone();
        assert_eq!(collection.update(2, &update), 0);
        assert_eq!(collection, before);
    }

    #[test]
    fn test_update_touches_all_rows_sharing_an_id() {
        let mut collection = Collection::from_records(vec![
            record(Some(1), "a", ""),
            record(Some(1), "b", ""),
            record(Some(2), "c", ""),
        ]);
        let update = RecordUpdate::from_pairs([("tags", "shared")]);
        assert_eq!(collection.update(1, &update), 2);
        assert_eq!(collection.records()[0].tags, "shared");
        assert_eq!(collection.records()[1].tags, "shared");
        assert_eq!(collection.records()[2].tags, "");
    }
}
