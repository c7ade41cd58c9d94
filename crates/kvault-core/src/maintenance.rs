//! Bulk maintenance transforms
//!
//! Whole-collection rewrites: duplicate removal, id reassignment, bulk
//! delete and clear. Row content is preserved; only membership, order and
//! ids change.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::collection::Collection;

/// Order `Some` values ascending with `None` last
fn cmp_unset_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Collection {
    /// Keep one record per (title, link) key
    ///
    /// Records are ordered by title, link and id (unset ids last) and the
    /// first of each key group survives. Returns the number removed.
    pub fn drop_duplicates(&mut self) -> usize {
        self.hold_last_id();
        let records = self.records_mut();
        let before = records.len();

        records.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| a.link.cmp(&b.link))
                .then_with(|| cmp_unset_last(&a.id, &b.id))
        });

        let mut seen = HashSet::new();
        records.retain(|r| seen.insert(r.dedup_key()));

        let removed = before - records.len();
        if removed > 0 {
            tracing::info!(removed, "Dropped duplicate records");
        }
        removed
    }

    /// Relabel ids 1..N in order of `date_added`, then current id
    ///
    /// Records whose date or id is missing or unparseable sort last.
    pub fn reassign_ids(&mut self) {
        self.reset_last_id();
        let records = self.records_mut();
        if records.is_empty() {
            return;
        }

        records.sort_by(|a, b| {
            cmp_unset_last(&a.added_at(), &b.added_at())
                .then_with(|| cmp_unset_last(&a.id, &b.id))
        });

        for (record, id) in records.iter_mut().zip(1u64..) {
            record.id = Some(id);
        }
        tracing::info!(count = records.len(), "Reassigned record ids");
    }

    /// Remove every record whose id is in `ids`
    ///
    /// Returns the number removed.
    pub fn bulk_delete(&mut self, ids: &[u64]) -> usize {
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        self.hold_last_id();
        let records = self.records_mut();
        let before = records.len();
        records.retain(|r| !r.id.is_some_and(|id| wanted.contains(&id)));
        before - records.len()
    }

    /// Remove every record
    ///
    /// Returns the number removed. Confirmation is the caller's business.
    pub fn clear_all(&mut self) -> usize {
        self.reset_last_id();
        let records = self.records_mut();
        let removed = records.len();
        records.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::AddOutcome;
    use crate::models::{DedupKey, NewRecord, Record};

    fn content_of(record: &Record) -> Record {
        Record {
            id: None,
            ..record.clone()
        }
    }

    fn row(id: Option<u64>, title: &str, link: &str, date: &str) -> Record {
        Record {
            id,
            title: title.to_string(),
            link: link.to_string(),
            date_added: date.to_string(),
            ..Record::blank()
        }
    }

    #[test]
    fn test_drop_duplicates_keeps_lowest_id() {
        let mut collection = Collection::from_records(vec![
            row(Some(4), "Rust", "http://r", ""),
            row(Some(2), "Rust", "http://r", ""),
            row(None, "Rust", "http://r", ""),
            row(Some(3), "Go", "http://g", ""),
        ]);
        let removed = collection.drop_duplicates();
        assert_eq!(removed, 2);
        assert_eq!(collection.len(), 2);

        let rust = collection.iter().find(|r| r.title == "Rust").unwrap();
        assert_eq!(rust.id, Some(2));
    }

    #[test]
    fn test_drop_duplicates_prefers_set_id_over_unset() {
        let mut collection = Collection::from_records(vec![
            row(None, "A", "", ""),
            row(Some(9), "A", "", ""),
        ]);
        collection.drop_duplicates();
        assert_eq!(collection.records()[0].id, Some(9));
    }

    #[test]
    fn test_drop_duplicates_uses_case_insensitive_key() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "SQL", "HTTP://X", ""),
            row(Some(2), "sql ", "http://x", ""),
            row(Some(3), "sql", "http://y", ""),
        ]);
        let before = collection.len();
        let removed = collection.drop_duplicates();

        let keys: HashSet<DedupKey> = collection.iter().map(Record::dedup_key).collect();
        assert_eq!(keys.len(), collection.len());
        assert_eq!(removed + collection.len(), before);
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_drop_duplicates_collapses_blank_rows() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "", "", ""),
            row(Some(2), "", "", ""),
        ]);
        assert_eq!(collection.drop_duplicates(), 1);
    }

    #[test]
    fn test_drop_duplicates_none_found() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "a", "", ""),
            row(Some(2), "b", "", ""),
        ]);
        assert_eq!(collection.drop_duplicates(), 0);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_reassign_ids_orders_by_date() {
        let mut collection = Collection::from_records(vec![
            row(Some(5), "feb", "", "2024-02-01 00:00:00"),
            row(Some(2), "jan", "", "2024-01-01 00:00:00"),
            row(Some(9), "mar", "", "2024-03-01 00:00:00"),
        ]);
        collection.reassign_ids();

        let pairs: Vec<_> = collection
            .iter()
            .map(|r| (r.id.unwrap(), r.title.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "jan"), (2, "feb"), (3, "mar")]);
    }

    #[test]
    fn test_reassign_ids_unset_dates_and_ids_last() {
        let mut collection = Collection::from_records(vec![
            row(None, "no id, no date", "", ""),
            row(Some(1), "garbage date", "", "soon"),
            row(Some(8), "dated", "", "2023-06-01 12:00:00"),
            row(None, "dated, no id", "", "2023-06-01 12:00:00"),
        ]);
        collection.reassign_ids();

        let titles: Vec<_> = collection.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["dated", "dated, no id", "garbage date", "no id, no date"]
        );
    }

    #[test]
    fn test_reassign_ids_sequence_and_permutation() {
        let mut collection = Collection::new();
        for title in ["x", "y", "z", "w"] {
            collection.add(NewRecord::new(title));
        }
        collection.delete(2);
        let mut before: Vec<_> = collection.iter().map(content_of).collect();

        collection.reassign_ids();
        let ids: Vec<_> = collection.iter().map(|r| r.id.unwrap()).collect();
        assert_eq!(ids, (1..=collection.len() as u64).collect::<Vec<_>>());

        let mut after: Vec<_> = collection.iter().map(content_of).collect();
        before.sort_by(|a, b| a.title.cmp(&b.title));
        after.sort_by(|a, b| a.title.cmp(&b.title));
        assert_eq!(before, after);
    }

    #[test]
    fn test_reassign_ids_empty() {
        let mut collection = Collection::new();
        collection.reassign_ids();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_bulk_delete() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "a", "", ""),
            row(Some(2), "b", "", ""),
            row(Some(3), "c", "", ""),
            row(None, "d", "", ""),
        ]);
        assert_eq!(collection.bulk_delete(&[1, 3, 99]), 2);
        let titles: Vec<_> = collection.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d"]);
    }

    #[test]
    fn test_clear_all() {
        let mut collection = Collection::from_records(vec![row(Some(1), "a", "", "")]);
        assert_eq!(collection.clear_all(), 1);
        assert_eq!(collection, Collection::new());
        assert_eq!(collection.add(NewRecord::new("fresh")), AddOutcome::Added(1));
    }

    #[test]
    fn test_bulk_delete_keeps_last_id() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "a", "", ""),
            row(Some(5), "b", "", ""),
        ]);
        collection.bulk_delete(&[5]);
        assert_eq!(collection.add(NewRecord::new("c")), AddOutcome::Added(6));
    }

    #[test]
    fn test_drop_duplicates_keeps_last_id() {
        let mut collection = Collection::from_records(vec![
            row(Some(1), "a", "l", ""),
            row(Some(2), "A", "L", ""),
        ]);
        assert_eq!(collection.drop_duplicates(), 1);
        assert_eq!(collection.last_id(), 2);
    }

    #[test]
    fn test_reassign_ids_resets_last_id() {
        let mut collection = Collection::new();
        for title in ["a", "b", "c", "d"] {
            collection.add(NewRecord::new(title));
        }
        collection.bulk_delete(&[2, 4]);
        assert_eq!(collection.last_id(), 4);

        collection.reassign_ids();
        assert_eq!(collection.last_id(), 2);
        assert_eq!(collection.add(NewRecord::new("e")), AddOutcome::Added(3));
    }
}
