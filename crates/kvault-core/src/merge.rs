//! Bulk import and merge
//!
//! Incoming rows are folded through [`Collection::add`] one at a time, so
//! deduplication runs against the growing result and every added row gets a
//! fresh id and timestamp.

use serde::Serialize;

use crate::collection::Collection;
use crate::models::NewRecord;

/// Outcome of a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Rows appended to the collection
    pub added: usize,
    /// Rows dropped as duplicates, or because no id was left for them
    pub skipped: usize,
}

impl MergeReport {
    fn from_counts(total: usize, added: usize) -> Self {
        Self {
            added,
            skipped: total.saturating_sub(added),
        }
    }
}

impl Collection {
    /// Merge a normalized collection of incoming rows
    ///
    /// Incoming ids and timestamps are discarded. Rows without a source are
    /// tagged "import".
    pub fn merge_import(&mut self, incoming: Collection) -> MergeReport {
        let candidates: Vec<NewRecord> = incoming
            .into_iter()
            .map(NewRecord::from_imported)
            .collect();
        self.merge_candidates(candidates)
    }

    /// Add each candidate in order, counting how many were accepted
    pub fn merge_candidates(&mut self, candidates: Vec<NewRecord>) -> MergeReport {
        let total = candidates.len();
        let mut added = 0;
        for candidate in candidates {
            if self.add(candidate).is_added() {
                added += 1;
            }
        }

        let report = MergeReport::from_counts(total, added);
        tracing::info!(added = report.added, skipped = report.skipped, "Merged records");
        report
    }
}
