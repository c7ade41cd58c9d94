//! Unified storage interface
//!
//! The `Store` binds a record collection to its file on disk. Each mutating
//! method applies a collection transform and then saves the whole
//! collection atomically, followed by the highest id handed out so far so
//! that ids of deleted records stay retired across runs.
//!
//! ## Failed saves
//!
//! If a save fails (for example because the file is open in a spreadsheet)
//! the error is returned but the in-memory collection keeps the change, so
//! nothing the user entered is lost. Call [`Store::save`] to retry.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;  // Loads the record file, or starts empty
//!
//! let outcome = store.add(NewRecord::new("SQL Basics").with_link("http://x"))?;
//! let books = store.collection().filter(&Filter::new().with_category(Category::Book));
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::codec::FileFormat;
use crate::collection::{AddOutcome, Collection};
use crate::config::Config;
use crate::merge::MergeReport;
use crate::models::{NewRecord, RecordUpdate};
use crate::storage::{self, StorageResult};

/// File-backed record store
pub struct Store {
    /// Current snapshot of every record
    collection: Collection,
    /// Configuration
    config: Config,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    ///
    /// A missing record file yields an empty store; a corrupt one is an error.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let path = config.records_path();
        let mut collection = storage::load(&path)
            .with_context(|| format!("Failed to load records from {:?}", path))?;

        let state_path = config.state_path();
        let last_id = storage::load_last_id(&state_path)
            .with_context(|| format!("Failed to load id state from {:?}", state_path))?;
        collection.raise_last_id(last_id);

        Ok(Self { collection, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the primary record file
    pub fn path(&self) -> PathBuf {
        self.config.records_path()
    }

    /// Current snapshot of every record
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Write the current collection and its id state to disk
    pub fn save(&self) -> StorageResult<()> {
        storage::save(&self.collection, &self.path())?;
        storage::save_last_id(self.collection.last_id(), &self.config.state_path())
    }

    fn persist(&self) -> Result<()> {
        self.save()
            .with_context(|| format!("Failed to save records to {:?}", self.path()))
    }

    // ==================== Record Operations ====================

    /// Add a record; duplicates are ignored and nothing is written
    pub fn add(&mut self, candidate: NewRecord) -> Result<AddOutcome> {
        let outcome = self.collection.add(candidate);
        if outcome.is_added() {
            self.persist()?;
        }
        Ok(outcome)
    }

    /// Update the record(s) with `id`; returns how many changed
    pub fn update(&mut self, id: u64, update: &RecordUpdate) -> Result<usize> {
        let touched = self.collection.update(id, update);
        if touched > 0 {
            self.persist()?;
        }
        Ok(touched)
    }

    /// Delete the record(s) with `id`; returns how many were removed
    pub fn delete(&mut self, id: u64) -> Result<usize> {
        let removed = self.collection.delete(id);
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    // ==================== Bulk Operations ====================

    /// Delete every record whose id is listed
    pub fn bulk_delete(&mut self, ids: &[u64]) -> Result<usize> {
        let removed = self.collection.bulk_delete(ids);
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Remove duplicate (title, link) records
    pub fn drop_duplicates(&mut self) -> Result<usize> {
        let removed = self.collection.drop_duplicates();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Relabel ids 1..N by date added
    pub fn reassign_ids(&mut self) -> Result<()> {
        self.collection.reassign_ids();
        self.persist()
    }

    /// Remove every record
    pub fn clear_all(&mut self) -> Result<usize> {
        let removed = self.collection.clear_all();
        self.persist()?;
        Ok(removed)
    }

    /// Merge already-decoded rows
    pub fn merge_import(&mut self, incoming: Collection) -> Result<MergeReport> {
        let report = self.collection.merge_import(incoming);
        if report.added > 0 {
            self.persist()?;
        }
        Ok(report)
    }

    /// Merge candidates produced by a content fetcher
    pub fn merge_candidates(&mut self, candidates: Vec<NewRecord>) -> Result<MergeReport> {
        let report = self.collection.merge_candidates(candidates);
        if report.added > 0 {
            self.persist()?;
        }
        Ok(report)
    }

    // ==================== Files ====================

    /// Merge the records of a CSV or JSON file
    pub fn import_file(&mut self, path: &Path) -> Result<MergeReport> {
        let incoming =
            storage::read_file(path).with_context(|| format!("Failed to import {:?}", path))?;
        self.merge_import(incoming)
    }

    /// Replace every record with the contents of a CSV or JSON file
    ///
    /// Rows are normalized but otherwise kept as they are, ids and dates
    /// included. Ids handed out since the snapshot stay retired.
    pub fn restore(&mut self, path: &Path) -> Result<usize> {
        let mut restored =
            storage::read_file(path).with_context(|| format!("Failed to restore {:?}", path))?;
        restored.raise_last_id(self.collection.last_id());
        self.collection = restored;
        self.persist()?;
        tracing::info!(?path, records = self.collection.len(), "Restored records");
        Ok(self.collection.len())
    }

    /// Write a timestamped snapshot next to the record file
    pub fn backup(&self) -> Result<PathBuf> {
        storage::backup(&self.collection, self.config.backup_dir()).context("Failed to create backup")
    }

    /// Export `records` (the whole store or a filtered subset) to a file
    pub fn export(&self, records: &Collection, path: &Path, format: FileFormat) -> Result<()> {
        storage::export_file(records, path, format)
            .with_context(|| format!("Failed to export to {:?}", path))
    }

    // ==================== Stats ====================

    /// Number of records
    pub fn count(&self) -> usize {
        self.collection.len()
    }

    /// Backups present in the data directory, oldest first
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        storage::list_backups(self.config.backup_dir()).context("Failed to list backups")
    }
}
