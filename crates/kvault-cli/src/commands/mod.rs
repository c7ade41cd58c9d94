//! Command handlers
//!
//! One module per command family. Each handler takes the open store (where
//! it needs one) and the shared [`Output`](crate::output::Output).

pub mod config;
pub mod fetch;
pub mod maintenance;
pub mod record;
pub mod stats;
pub mod status;
pub mod tag;
pub mod transfer;

use clap::Args;

use kvault_core::{Category, Filter};

/// Filter flags shared by `list` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Text to look for in any field
    #[arg(short, long)]
    pub search: Option<String>,
    /// Only this category
    #[arg(short, long)]
    pub category: Option<Category>,
    /// Only records whose tags contain this text
    #[arg(short, long)]
    pub tag: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(ref term) = self.search {
            filter = filter.with_term(term.as_str());
        }
        if let Some(category) = self.category {
            filter = filter.with_category(category);
        }
        if let Some(ref tag) = self.tag {
            filter = filter.with_tag(tag.as_str());
        }
        filter
    }
}
