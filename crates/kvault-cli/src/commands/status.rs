//! Status command handler

use anyhow::Result;

use kvault_core::Store;

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, output: &Output) -> Result<()> {
    let path = store.path();
    let size = std::fs::metadata(&path).map(|m| m.len()).ok();
    let backups = store.backups()?;
    let latest_backup = backups.last();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_file": path,
                    "exists": size.is_some(),
                    "size": size,
                    "records": store.count(),
                    "backups": backups.len(),
                    "latest_backup": latest_backup,
                    "youtube_enabled": store.config().youtube_api_key.is_some(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.count());
        }
        OutputFormat::Human => {
            println!("KnowledgeVault Status");
            println!("=====================");
            println!();
            println!("Storage:");
            println!("  File:    {}", path.display());
            match size {
                Some(bytes) => println!("  Size:    {}", format_size(bytes)),
                None => println!("  Size:    (not created yet)"),
            }
            println!("  Backups: {}", backups.len());
            if let Some(latest) = latest_backup {
                println!("  Latest:  {}", latest.display());
            }
            println!();
            println!("Contents:");
            println!("  Records: {}", store.count());
            println!();
            println!(
                "YouTube fetching: {}",
                if store.config().youtube_api_key.is_some() {
                    "enabled"
                } else {
                    "disabled (no youtube_api_key)"
                }
            );
        }
    }

    Ok(())
}

/// Human-readable byte count
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
