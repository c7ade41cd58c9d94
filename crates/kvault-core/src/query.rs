//! Filtering and lookup over a collection
//!
//! Filters are plain values built by the caller; the store keeps no notion
//! of a current search or selection.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::collection::Collection;
use crate::models::{Category, Record};
use crate::schema::Column;

/// Search and field filters, all optional and combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Case-insensitive substring matched against every column
    pub term: Option<String>,
    /// Exact category
    pub category: Option<Category>,
    /// Case-insensitive substring matched against the tags column
    pub tag: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// True when the filter accepts every record
    pub fn is_empty(&self) -> bool {
        blank(&self.term) && self.category.is_none() && blank(&self.tag)
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(term) = non_blank(&self.term) {
            let haystack = Column::ALL
                .iter()
                .map(|&c| record.value(c))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !haystack.contains(&term) {
                return false;
            }
        }

        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }

        if let Some(tag) = non_blank(&self.tag) {
            if !record.tags.to_lowercase().contains(&tag) {
                return false;
            }
        }

        true
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl Collection {
    /// Records accepted by `filter`, in stored order
    pub fn filter(&self, filter: &Filter) -> Collection {
        self.iter().filter(|r| filter.matches(r)).cloned().collect()
    }

    /// Records whose id is in `ids`, in stored order
    pub fn select_ids(&self, ids: &[u64]) -> Collection {
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        self.iter()
            .filter(|r| r.id.is_some_and(|id| wanted.contains(&id)))
            .cloned()
            .collect()
    }

    /// Every distinct tag, sorted
    pub fn all_tags(&self) -> Vec<String> {
        self.iter()
            .flat_map(|r| r.tag_list())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct tags with the number of records carrying each, sorted by tag
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in self {
            let tags: BTreeSet<&str> = record.tag_list().collect();
            for tag in tags {
                *counts.entry(tag.to_string()).or_default() += 1;
            }
        }
        counts.into_iter().collect()
    }

    /// Categories that occur at least once, in display order
    pub fn categories_present(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.iter().any(|r| r.category == *c))
            .collect()
    }
}
