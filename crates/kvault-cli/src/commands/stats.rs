//! Stats command handler

use anyhow::Result;

use kvault_core::Store;

use crate::output::Output;

/// Show record counts by category and by month added
pub fn show(store: &Store, output: &Output) -> Result<()> {
    output.print_summary(&store.collection().summary());
    Ok(())
}
