//! Record file persistence
//!
//! Handles loading and saving the record collection to/from the filesystem.
//! Uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/kvault/` (configurable via `Config`)
//!
//! Files:
//! - `knowledge_data.csv` - The primary record store
//! - `knowledge_state.toml` - Highest id ever handed out, so deleted ids stay retired
//! - `knowledge_backup_YYYYMMDD_HHMMSS.csv` - Snapshots written by `backup`

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{StorageError, StorageResult};
use crate::codec::{self, DecodeError, FileFormat};
use crate::collection::{Collection, MAX_ID};

/// File name prefix shared by all backups
pub const BACKUP_PREFIX: &str = "knowledge_backup_";

/// Sortable stamp embedded in backup file names
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Load the record store
///
/// A missing file is an empty store. A file that exists but cannot be
/// read or parsed is an error; it is never silently treated as empty.
pub fn load(path: &Path) -> StorageResult<Collection> {
    if !path.exists() {
        debug!(?path, "No record file yet, starting empty");
        return Ok(Collection::new());
    }

    let bytes = fs::read(path).map_err(|source| StorageError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let collection = codec::read_csv(&bytes).map_err(|e| invalid_format(path, e))?;
    debug!(?path, records = collection.len(), "Loaded records");
    Ok(collection)
}

/// Save the whole collection atomically
///
/// On failure the previous file is left exactly as it was.
pub fn save(collection: &Collection, path: &Path) -> StorageResult<()> {
    let bytes = codec::write_csv(collection)?;
    atomic_write(path, &bytes)?;
    debug!(?path, records = collection.len(), "Saved records");
    Ok(())
}

/// Contents of the id state file
#[derive(Debug, Default, Serialize, Deserialize)]
struct IdState {
    last_id: u64,
}

/// Load the highest id ever handed out
///
/// A missing file means none has been recorded yet.
pub fn load_last_id(path: &Path) -> StorageResult<u64> {
    if !path.exists() {
        return Ok(0);
    }

    let content = fs::read_to_string(path).map_err(|source| StorageError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let state: IdState = toml::from_str(&content).map_err(|e| StorageError::InvalidFormat {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    if state.last_id > MAX_ID {
        return Err(StorageError::InvalidFormat {
            path: path.to_path_buf(),
            details: format!("last_id {} is above the largest id {}", state.last_id, MAX_ID),
        });
    }
    Ok(state.last_id)
}

/// Save the highest id ever handed out
pub fn save_last_id(last_id: u64, path: &Path) -> StorageResult<()> {
    let content = toml::to_string(&IdState { last_id })?;
    atomic_write(path, content.as_bytes())?;
    debug!(?path, last_id, "Saved id state");
    Ok(())
}

/// Read records from a CSV or JSON file, choosing the decoder by extension
pub fn read_file(path: &Path) -> StorageResult<Collection> {
    let format = readable_format(path)?;

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound {
            path: path.to_path_buf(),
        },
        _ => StorageError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    codec::decode(&bytes, format)
        .map_err(|e| invalid_format(path, e))?
        .ok_or_else(|| StorageError::UnsupportedFormat {
            path: path.to_path_buf(),
            details: format!("{format} files can be exported but not read"),
        })
}

/// Write records to `path` in the given format
pub fn export_file(collection: &Collection, path: &Path, format: FileFormat) -> StorageResult<()> {
    let bytes = codec::encode(collection, format)?;
    atomic_write(path, &bytes)?;
    info!(?path, %format, records = collection.len(), "Exported records");
    Ok(())
}

/// Write an empty CSV holding only the header row
pub fn write_template(path: &Path) -> StorageResult<()> {
    let bytes = codec::template_csv()?;
    atomic_write(path, &bytes)?;
    debug!(?path, "Wrote template");
    Ok(())
}

/// Backup file name for a given moment
pub fn backup_file_name(stamp: NaiveDateTime) -> String {
    format!("{}{}.csv", BACKUP_PREFIX, stamp.format(BACKUP_STAMP_FORMAT))
}

/// Write a timestamped snapshot into `dir`
///
/// The primary store is not touched. Returns the path written.
pub fn backup(collection: &Collection, dir: &Path) -> StorageResult<PathBuf> {
    backup_at(collection, dir, Local::now().naive_local())
}

/// Write a snapshot stamped with `stamp`
///
/// A second backup within the same second gets a numeric suffix rather
/// than overwriting the first.
pub fn backup_at(collection: &Collection, dir: &Path, stamp: NaiveDateTime) -> StorageResult<PathBuf> {
    let name = backup_file_name(stamp);
    let mut path = dir.join(&name);
    let mut suffix = 1;
    while path.exists() {
        let stem = name.trim_end_matches(".csv");
        path = dir.join(format!("{stem}_{suffix}.csv"));
        suffix += 1;
    }

    let bytes = codec::write_csv(collection)?;
    atomic_write(&path, &bytes)?;
    info!(?path, records = collection.len(), "Created backup");
    Ok(path)
}

/// Backups in `dir`, oldest first
pub fn list_backups(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| StorageError::ReadError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut backups: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".csv"))
        })
        .collect();
    backups.sort_by_cached_key(|path| backup_order(path));
    Ok(backups)
}

/// Sort key for a backup: its stamp, then the same-second suffix as a number
fn backup_order(path: &Path) -> (String, u64) {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let rest = stem.strip_prefix(BACKUP_PREFIX).unwrap_or(stem);
    // "%Y%m%d_%H%M%S" always renders as 15 characters
    let (stamp, suffix) = match (rest.get(..15), rest.get(15..)) {
        (Some(stamp), Some(suffix)) => (stamp, suffix),
        _ => (rest, ""),
    };
    let suffix = suffix
        .strip_prefix('_')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    (stamp.to_string(), suffix)
}

fn readable_format(path: &Path) -> StorageResult<FileFormat> {
    match FileFormat::from_path(path) {
        Some(format) if format.is_readable() => Ok(format),
        Some(format) => Err(StorageError::UnsupportedFormat {
            path: path.to_path_buf(),
            details: format!("{format} files can be exported but not read"),
        }),
        None => Err(StorageError::UnsupportedFormat {
            path: path.to_path_buf(),
            details: "expected a .csv or .json file".to_string(),
        }),
    }
}

fn invalid_format(path: &Path, error: DecodeError) -> StorageError {
    StorageError::InvalidFormat {
        path: path.to_path_buf(),
        details: error.to_string(),
    }
}

/// Temp file next to `path`, so the final rename stays on one filesystem
fn temp_path_for(path: &Path) -> StorageResult<PathBuf> {
    let mut name: OsString = path
        .file_name()
        .ok_or_else(|| StorageError::WriteError {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = temp_path_for(path)?;

    if let Err(e) = write_synced(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::from_io(e, temp_path));
    }

    // Atomic rename
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        let err = StorageError::from_rename(e, temp_path, path.to_path_buf());
        if err.is_locked() {
            warn!(?path, "Destination is in use, save skipped");
        }
        return Err(err);
    }

    Ok(())
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    // Sync to disk before rename
    file.sync_all()
}
