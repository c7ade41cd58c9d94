//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use kvault_core::{Collection, MergeReport, Record, Summary};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single record
    pub fn print_record(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", display_id(record));
                println!("Title:    {}", record.title);
                println!("Category: {}", record.category);
                if !record.link.is_empty() {
                    println!("Link:     {}", record.link);
                }
                if !record.tags.is_empty() {
                    println!("Tags:     {}", record.tags);
                }
                println!("Source:   {}", record.source);
                println!("Added:    {}", record.date_added);
                if !record.notes.is_empty() {
                    println!();
                    println!("{}", record.notes);
                }
            }
            OutputFormat::Json => print_json(record),
            OutputFormat::Quiet => println!("{}", display_id(record)),
        }
    }

    /// Print a list of records
    pub fn print_records(&self, records: &Collection) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No records found.");
                    return;
                }
                for record in records {
                    println!(
                        "{:>5} | {:<14} | {} | {}",
                        display_id(record),
                        record.category.as_str(),
                        truncate(&record.title, 40),
                        truncate(&record.link, 45)
                    );
                }
                println!("\n{} record(s)", records.len());
            }
            OutputFormat::Json => print_json(records),
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", display_id(record));
                }
            }
        }
    }

    /// Print a list of tags with counts
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print aggregate counts
    pub fn print_summary(&self, summary: &Summary) {
        match self.format {
            OutputFormat::Human => {
                println!("Records:   {}", summary.total);
                println!("With link: {}", summary.with_link);
                if !summary.categories.is_empty() {
                    println!();
                    println!("By category:");
                    for (category, count) in &summary.categories {
                        println!(
                            "  {:<14} {:>4}  {}",
                            category.as_str(),
                            count,
                            percent(*count, summary.total)
                        );
                    }
                }
                if !summary.months.is_empty() {
                    println!();
                    println!("By month:");
                    for (month, count) in &summary.months {
                        println!("  {}  {:>4}  {}", month, count, bar(*count));
                    }
                }
            }
            OutputFormat::Json => {
                let categories: Vec<_> = summary
                    .categories
                    .iter()
                    .map(|(c, n)| serde_json::json!({"category": c, "count": n}))
                    .collect();
                let months: Vec<_> = summary
                    .months
                    .iter()
                    .map(|(m, n)| serde_json::json!({"month": m, "count": n}))
                    .collect();
                print_json(&serde_json::json!({
                    "total": summary.total,
                    "with_link": summary.with_link,
                    "categories": categories,
                    "months": months,
                }));
            }
            OutputFormat::Quiet => println!("{}", summary.total),
        }
    }

    /// Print the outcome of an import or fetch
    pub fn print_merge(&self, report: &MergeReport, what: &str) {
        match self.format {
            OutputFormat::Human => println!(
                "✓ {}: added {}, skipped {} duplicate(s)",
                what, report.added, report.skipped
            ),
            OutputFormat::Json => print_json(report),
            OutputFormat::Quiet => println!("{}", report.added),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning (always to stderr, except in quiet mode)
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

fn display_id(record: &Record) -> String {
    record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        return String::new();
    }
    format!("{:.0}%", count as f64 * 100.0 / total as f64)
}

fn bar(count: usize) -> String {
    "█".repeat(count.min(50))
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
