//! Backup, restore, import and export command handlers

use std::path::Path;

use anyhow::{Context, Result};

use kvault_core::storage;
use kvault_core::{FileFormat, Store};

use super::FilterArgs;
use crate::output::{Output, OutputFormat};

/// Write a timestamped backup
pub fn backup(store: &Store, output: &Output) -> Result<()> {
    let path = store.backup()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"path": path, "records": store.count()})
            );
        }
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!(
            "Backed up {} record(s) to {}",
            store.count(),
            path.display()
        )),
    }

    Ok(())
}

/// Replace every record with a file's contents
pub fn restore(store: &mut Store, file: &Path, output: &Output) -> Result<()> {
    let restored = store.restore(file)?;
    output.success(&format!(
        "Restored {} record(s) from {}",
        restored,
        file.display()
    ));
    Ok(())
}

/// Merge a file's records, skipping duplicates
pub fn import(store: &mut Store, file: &Path, output: &Output) -> Result<()> {
    let report = store.import_file(file)?;
    output.print_merge(&report, "Imported");
    Ok(())
}

/// Export all, selected or filtered records
///
/// `ids` and the filter flags combine: a record must be listed (when any ids
/// are given) and pass the filter.
pub fn export(
    store: &Store,
    file: &Path,
    format: Option<FileFormat>,
    ids: &[u64],
    filter: &FilterArgs,
    output: &Output,
) -> Result<()> {
    let format = format
        .or_else(|| FileFormat::from_path(file))
        .with_context(|| {
            format!(
                "Cannot tell the export format from {:?}. Use a .csv, .json or .xlsx name, or pass --format.",
                file
            )
        })?;

    let selected = if ids.is_empty() {
        store.collection().clone()
    } else {
        store.collection().select_ids(ids)
    };
    let records = selected.filter(&filter.to_filter());

    store.export(&records, file, format)?;
    output.success(&format!(
        "Exported {} record(s) to {} ({})",
        records.len(),
        file.display(),
        format
    ));
    Ok(())
}

/// Write an empty CSV with the header row
pub fn template(file: &Path, output: &Output) -> Result<()> {
    storage::write_template(file)
        .with_context(|| format!("Failed to write template to {:?}", file))?;
    output.success(&format!("Wrote template to {}", file.display()));
    Ok(())
}
