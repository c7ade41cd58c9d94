//! KnowledgeVault CLI
//!
//! Command-line interface for KnowledgeVault - a personal catalogue of
//! books, videos, articles and courses kept in a single CSV file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kvault_core::{Config, FileFormat, StorageError, Store};

mod commands;
mod editor;
mod fetch;
mod output;

use commands::record::{AddArgs, EditArgs};
use commands::FilterArgs;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "kvault")]
#[command(about = "KnowledgeVault - Personal catalogue of learning resources")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a record
    Add(AddArgs),
    /// List records, optionally filtered
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show a single record
    Show {
        /// Record ID
        id: u64,
    },
    /// Change fields of a record
    Edit(EditArgs),
    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete several records at once
    BulkDelete {
        /// Record IDs
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove records sharing a title and link
    Dedupe,
    /// Renumber records 1..N in order of addition
    ReassignIds,
    /// Delete every record
    Clear {
        /// Confirm without prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Write a timestamped backup next to the record file
    Backup,
    /// Replace every record with the contents of a CSV or JSON file
    Restore {
        /// File to restore from
        file: PathBuf,
    },
    /// Merge records from a CSV or JSON file, skipping duplicates
    Import {
        /// File to import
        file: PathBuf,
    },
    /// Export records to CSV, JSON or XLSX
    Export {
        /// Destination file
        file: PathBuf,
        /// Output format (inferred from the file extension when omitted)
        #[arg(short, long)]
        format: Option<FileFormat>,
        /// Only export these record IDs
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write an empty CSV with just the header row
    Template {
        /// Destination file
        file: PathBuf,
    },
    /// List all tags
    Tags,
    /// Show record counts by category and month
    Stats,
    /// Search Google Books and YouTube for a topic and add the results
    Fetch {
        /// Topic to search for
        query: String,
        /// Items per source (1-20, defaults to fetch_limit)
        #[arg(short = 'n', long)]
        limit: Option<u32>,
        /// Skip Google Books
        #[arg(long)]
        no_books: bool,
        /// Skip YouTube
        #[arg(long)]
        no_youtube: bool,
        /// Show what would be added without saving
        #[arg(long)]
        preview: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show data file location and counts
    Status,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, youtube_api_key, fetch_limit, fetch_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config;

    // Commands that don't need the store
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), config_path.as_ref(), output);
        }
        Commands::Template { file } => return commands::transfer::template(file, output),
        _ => {}
    }

    let config = Config::load_with_cli_override(config_path.as_ref())?;
    let mut store = Store::open_with_config(config)?;

    match cli.command {
        Commands::Add(args) => commands::record::add(&mut store, args, output),
        Commands::List { filter } => commands::record::list(&store, &filter, output),
        Commands::Show { id } => commands::record::show(&store, id, output),
        Commands::Edit(args) => commands::record::edit(&mut store, args, output),
        Commands::Delete { id, yes } => commands::record::delete(&mut store, id, yes, output),
        Commands::BulkDelete { ids, yes } => {
            commands::maintenance::bulk_delete(&mut store, &ids, yes, output)
        }
        Commands::Dedupe => commands::maintenance::dedupe(&mut store, output),
        Commands::ReassignIds => commands::maintenance::reassign_ids(&mut store, output),
        Commands::Clear { yes } => commands::maintenance::clear(&mut store, yes, output),
        Commands::Backup => commands::transfer::backup(&store, output),
        Commands::Restore { file } => commands::transfer::restore(&mut store, &file, output),
        Commands::Import { file } => commands::transfer::import(&mut store, &file, output),
        Commands::Export {
            file,
            format,
            ids,
            filter,
        } => commands::transfer::export(&store, &file, format, &ids, &filter, output),
        Commands::Tags => commands::tag::list(&store, output),
        Commands::Stats => commands::stats::show(&store, output),
        Commands::Fetch {
            query,
            limit,
            no_books,
            no_youtube,
            preview,
        } => {
            let options = commands::fetch::FetchOptions {
                limit,
                books: !no_books,
                youtube: !no_youtube,
                preview,
            };
            commands::fetch::run(&mut store, &query, options, output).await
        }
        Commands::Status => commands::status::show(&store, output),
        Commands::Config { .. } | Commands::Template { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install the stderr logger
///
/// `KVAULT_LOG` takes a full filter directive; otherwise `-v` picks the level.
fn init_logging(verbose: u8) {
    let env_filter = match std::env::var("KVAULT_LOG") {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::new(directive),
        _ => {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                _ => "debug",
            };
            EnvFilter::new(format!("kvault_core={},kvault={}", level, level))
        }
    };

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print an error chain, plus a hint when the storage layer has one
fn report_error(error: &anyhow::Error) {
    eprintln!("Error: {:#}", error);

    if let Some(storage_error) = error.downcast_ref::<StorageError>() {
        if storage_error.is_locked() {
            eprintln!("Your change is not saved.");
        }
        if let Some(hint) = storage_error.recovery_suggestion() {
            eprintln!("Hint: {}", hint);
        }
    }
}
