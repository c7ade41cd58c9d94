//! Storage layer
//!
//! Handles persistence of the record collection.
//!
//! ## Files
//!
//! - **Primary store**: a single CSV file, replaced atomically on every save
//! - **Id state**: a small TOML file holding the highest id ever handed out
//! - **Backups**: independent timestamped CSV snapshots next to the store
//!
//! Imports and exports in other formats go through the same atomic write
//! path and the same schema normalization.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::{
    backup, backup_file_name, export_file, list_backups, load, load_last_id, read_file, save,
    save_last_id, write_template,
};
