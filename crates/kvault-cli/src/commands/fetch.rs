//! Fetch command handler

use anyhow::{bail, Result};

use kvault_core::{Collection, NewRecord, Store};

use crate::fetch::Fetcher;
use crate::output::Output;

/// Which sources to query and what to do with the results
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Items per source; the configured limit when `None`
    pub limit: Option<u32>,
    pub books: bool,
    pub youtube: bool,
    /// Show the new records without saving them
    pub preview: bool,
}

/// Search the content sources and merge what they return
pub async fn run(store: &mut Store, query: &str, options: FetchOptions, output: &Output) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Fetch query cannot be empty");
    }
    if !options.books && !options.youtube {
        bail!("Both sources are disabled; drop --no-books or --no-youtube");
    }

    let mut fetcher = Fetcher::from_config(store.config())?;
    if let Some(limit) = options.limit {
        fetcher = fetcher.with_limit(limit);
    }

    if options.youtube && !fetcher.has_youtube_key() {
        output.warning("YouTube results skipped (no youtube_api_key configured)");
    }

    let (books, videos) = tokio::join!(
        async {
            if options.books {
                fetcher.books(query).await
            } else {
                Vec::new()
            }
        },
        async {
            if options.youtube {
                fetcher.youtube(query).await
            } else {
                Vec::new()
            }
        }
    );

    let candidates: Vec<NewRecord> = books.into_iter().chain(videos).collect();
    if candidates.is_empty() {
        output.message("Nothing found.");
        return Ok(());
    }

    if options.preview {
        let fresh = preview(store.collection(), candidates);
        output.print_records(&fresh);
        return Ok(());
    }

    let report = store.merge_candidates(candidates)?;
    output.print_merge(&report, "Fetched");
    Ok(())
}

/// The records a merge would add, with the ids they would get
fn preview(current: &Collection, candidates: Vec<NewRecord>) -> Collection {
    let mut scratch = current.clone();
    let before = scratch.len();
    scratch.merge_candidates(candidates);
    scratch.into_records().split_off(before).into_iter().collect()
}
