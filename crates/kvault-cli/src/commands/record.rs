//! Record command handlers

use anyhow::{bail, Context, Result};
use clap::Args;

use kvault_core::{AddOutcome, Category, NewRecord, Record, RecordUpdate, Store};

use super::FilterArgs;
use crate::editor::{confirm, edit_text};
use crate::output::Output;

/// Fields for `add`
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Title of the resource
    pub title: String,
    /// Category (Book, YouTube, Article, Course, Research Paper, Other)
    #[arg(short, long)]
    pub category: Option<Category>,
    /// URL of the resource
    #[arg(short, long)]
    pub link: Option<String>,
    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,
    /// Where the record came from (defaults to "manual")
    #[arg(long)]
    pub source: Option<String>,
}

impl AddArgs {
    fn into_candidate(self) -> NewRecord {
        NewRecord {
            title: self.title,
            category: self.category.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            source: self.source,
        }
    }
}

/// Fields for `edit`; only the flags given are changed
#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Record ID
    pub id: u64,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New category
    #[arg(short, long)]
    pub category: Option<Category>,
    /// New link
    #[arg(short, long)]
    pub link: Option<String>,
    /// New notes
    #[arg(short, long, conflicts_with = "editor")]
    pub notes: Option<String>,
    /// New comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,
    /// New source
    #[arg(long)]
    pub source: Option<String>,
    /// Edit the notes in $EDITOR
    #[arg(short, long)]
    pub editor: bool,
}

/// Add a record
pub fn add(store: &mut Store, args: AddArgs, output: &Output) -> Result<()> {
    if args.title.trim().is_empty() {
        bail!("Title cannot be empty");
    }

    match store.add(args.into_candidate())? {
        AddOutcome::Added(id) => {
            let record = find(store, id)?;
            if !output.is_json() {
                output.success(&format!("Added record {}", id));
            }
            output.print_record(record);
        }
        AddOutcome::Duplicate => {
            output.warning("A record with the same title and link already exists; nothing added");
        }
        AddOutcome::IdsExhausted => {
            bail!("Every record id has been used; run `kvault reassign-ids` to free them");
        }
    }

    Ok(())
}

/// List records, optionally filtered
pub fn list(store: &Store, filter: &FilterArgs, output: &Output) -> Result<()> {
    let records = store.collection().filter(&filter.to_filter());
    output.print_records(&records);
    Ok(())
}

/// Show a single record
pub fn show(store: &Store, id: u64, output: &Output) -> Result<()> {
    output.print_record(find(store, id)?);
    Ok(())
}

/// Edit a record
pub fn edit(store: &mut Store, args: EditArgs, output: &Output) -> Result<()> {
    let current = find(store, args.id)?;

    let notes = if args.editor {
        let edited = edit_text(&current.notes).context("Failed to edit notes")?;
        Some(edited.trim_end().to_string())
    } else {
        args.notes
    };

    let update = RecordUpdate {
        title: args.title,
        category: args.category,
        link: args.link,
        notes,
        tags: args.tags,
        source: args.source,
    };

    if update.is_empty() {
        bail!("Nothing to change. Pass at least one of --title, --category, --link, --notes, --tags, --source or --editor.");
    }
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        bail!("Title cannot be empty");
    }

    let touched = store.update(args.id, &update)?;

    if !output.is_json() {
        output.success(&format!("Updated {} record(s)", touched));
    }
    output.print_record(find(store, args.id)?);

    Ok(())
}

/// Delete a record
pub fn delete(store: &mut Store, id: u64, yes: bool, output: &Output) -> Result<()> {
    let record = find(store, id)?;

    if !yes && output.should_prompt() {
        println!("Delete record {}: {}", id, record.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.delete(id)?;
    output.success(&format!("Deleted {} record(s)", removed));

    Ok(())
}

fn find(store: &Store, id: u64) -> Result<&Record> {
    store
        .collection()
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("No record with id {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use kvault_core::Config;
    use tempfile::TempDir;

    fn open(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        Store::open_with_config(config).unwrap()
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn add_args(title: &str, link: &str) -> AddArgs {
        AddArgs {
            title: title.to_string(),
            category: Some(Category::Book),
            link: Some(link.to_string()),
            notes: None,
            tags: Some("sql".to_string()),
            source: None,
        }
    }

    fn edit_args(id: u64) -> EditArgs {
        EditArgs {
            id,
            title: None,
            category: None,
            link: None,
            notes: None,
            tags: None,
            source: None,
            editor: false,
        }
    }

    #[test]
    fn test_add_rejects_blank_title() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);
        assert!(add(&mut store, add_args("   ", "http://x"), &quiet()).is_err());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_duplicate_add_succeeds_without_adding() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);
        add(&mut store, add_args("SQL Basics", "http://x"), &quiet()).unwrap();
        add(&mut store, add_args("sql basics ", "HTTP://X"), &quiet()).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.collection().get(1).unwrap().source, "manual");
    }

    #[test]
    fn test_edit_changes_only_given_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);
        add(&mut store, add_args("SQL Basics", "http://x"), &quiet()).unwrap();

        let args = EditArgs {
            notes: Some("read chapter 2".to_string()),
            ..edit_args(1)
        };
        edit(&mut store, args, &quiet()).unwrap();

        let record = store.collection().get(1).unwrap();
        assert_eq!(record.notes, "read chapter 2");
        assert_eq!(record.title, "SQL Basics");
        assert_eq!(record.category, Category::Book);
    }

    #[test]
    fn test_edit_without_changes_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);
        add(&mut store, add_args("SQL Basics", "http://x"), &quiet()).unwrap();
        assert!(edit(&mut store, edit_args(1), &quiet()).is_err());
        assert!(edit(&mut store, edit_args(7), &quiet()).is_err());
    }

    #[test]
    fn test_delete_without_prompt_in_quiet_mode() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);
        add(&mut store, add_args("SQL Basics", "http://x"), &quiet()).unwrap();

        delete(&mut store, 1, false, &quiet()).unwrap();
        assert_eq!(store.count(), 0);
        assert!(delete(&mut store, 1, true, &quiet()).is_err());
    }
}
