//! Bulk maintenance command handlers

use anyhow::{bail, Result};

use kvault_core::Store;

use crate::editor::{confirm, is_interactive};
use crate::output::Output;

/// Delete every record whose id is listed
pub fn bulk_delete(store: &mut Store, ids: &[u64], yes: bool, output: &Output) -> Result<()> {
    let matching = store.collection().select_ids(ids).len();
    if matching == 0 {
        output.message("No matching records.");
        return Ok(());
    }

    if !yes && output.should_prompt() && !confirm(&format!("Delete {} record(s)?", matching))? {
        println!("Cancelled.");
        return Ok(());
    }

    let removed = store.bulk_delete(ids)?;
    output.success(&format!("Deleted {} record(s)", removed));
    Ok(())
}

/// Remove records sharing a title and link
pub fn dedupe(store: &mut Store, output: &Output) -> Result<()> {
    let removed = store.drop_duplicates()?;
    output.success(&format!("Removed {} duplicate record(s)", removed));
    Ok(())
}

/// Renumber records 1..N by date added
pub fn reassign_ids(store: &mut Store, output: &Output) -> Result<()> {
    store.reassign_ids()?;
    output.success(&format!("Renumbered {} record(s)", store.count()));
    Ok(())
}

/// Delete every record
///
/// Without `--yes` this asks first, and refuses outright when it cannot ask.
pub fn clear(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() || !is_interactive() {
            bail!("Refusing to delete every record without confirmation. Pass --yes to proceed.");
        }
        if !confirm(&format!("Delete all {} record(s)?", store.count()))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.clear_all()?;
    output.success(&format!("Deleted {} record(s)", removed));
    Ok(())
}
