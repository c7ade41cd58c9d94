//! Tag command handlers

use anyhow::Result;

use kvault_core::Store;

use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let tags = store.collection().tag_counts();
    output.print_tags(&tags);
    Ok(())
}
