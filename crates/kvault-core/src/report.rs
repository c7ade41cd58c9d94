//! Aggregate reports over a collection

use std::collections::BTreeMap;

use serde::Serialize;

use crate::collection::Collection;
use crate::models::Category;

/// Record counts for the `stats` view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub with_link: usize,
    pub categories: Vec<(Category, usize)>,
    pub months: Vec<(String, usize)>,
}

impl Collection {
    /// Records per category, most common first; ties by label
    pub fn count_by_category(&self) -> Vec<(Category, usize)> {
        let mut counts: Vec<(Category, usize)> = Category::ALL
            .into_iter()
            .map(|c| (c, self.iter().filter(|r| r.category == c).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        counts
    }

    /// Records per `YYYY-MM` month of `date_added`, oldest first
    ///
    /// Records without a parseable date are left out.
    pub fn count_by_month(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for added in self.iter().filter_map(|r| r.added_at()) {
            *counts.entry(added.format("%Y-%m").to_string()).or_default() += 1;
        }
        counts.into_iter().collect()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.len(),
            with_link: self.iter().filter(|r| !r.link.trim().is_empty()).count(),
            categories: self.count_by_category(),
            months: self.count_by_month(),
        }
    }
}
