//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use kvault_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "records_path": config.records_path(),
                    "youtube_api_key_set": config.youtube_api_key.is_some(),
                    "fetch_limit": config.fetch_limit,
                    "fetch_timeout_secs": config.fetch_timeout_secs
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:           {}", config.data_dir.display());
            println!(
                "  youtube_api_key:    {}",
                if config.youtube_api_key.is_some() {
                    "(set)"
                } else {
                    "(not set)"
                }
            );
            println!("  fetch_limit:        {}", config.fetch_limit);
            println!("  fetch_timeout_secs: {}", config.fetch_timeout_secs);
            println!();
            println!("Record file: {}", config.records_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "youtube_api_key" && !value.is_empty() {
        "(hidden)"
    } else {
        value.as_str()
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "youtube_api_key" => {
            config.youtube_api_key = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "fetch_limit" => {
            let limit: u32 = value
                .parse()
                .context("Invalid value for fetch_limit. Use a number from 1 to 20.")?;
            if !(1..=kvault_core::config::MAX_FETCH_LIMIT).contains(&limit) {
                bail!("fetch_limit must be between 1 and 20");
            }
            config.fetch_limit = limit;
        }
        "fetch_timeout_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for fetch_timeout_secs. Use a whole number of seconds.")?;
            if secs == 0 {
                bail!("fetch_timeout_secs must be at least 1");
            }
            config.fetch_timeout_secs = secs;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, youtube_api_key, fetch_limit, fetch_timeout_secs",
                key
            );
        }
    }
    Ok(())
}
