//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File contents cannot be parsed as records
    #[error("Invalid data in '{path}': {details}")]
    InvalidFormat { path: PathBuf, details: String },

    /// Extension or format name not recognized for the requested direction
    #[error("Unsupported format for '{path}': {details}")]
    UnsupportedFormat { path: PathBuf, details: String },

    /// File not found (when expected to exist)
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The destination is held open by another process
    #[error("Could not replace '{path}': the file is in use by another program. Your changes were not written.")]
    DestinationLocked {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Id state encoding error
    #[error("State encoding error: {0}")]
    State(#[from] toml::ser::Error),

    /// Spreadsheet encoding error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            // StorageFull is available but may not be on all platforms
            // Also check for "No space left" in the error message
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Classify a failed rename of `from` over `to`
    pub fn from_rename(error: io::Error, from: PathBuf, to: PathBuf) -> Self {
        if is_lock_error(&error) {
            StorageError::DestinationLocked {
                path: to,
                source: error,
            }
        } else if error.kind() == io::ErrorKind::PermissionDenied {
            StorageError::PermissionDenied {
                path: to,
                source: error,
            }
        } else {
            StorageError::AtomicWriteFailed {
                from,
                to,
                source: error,
            }
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::DestinationLocked { .. }
        )
    }

    /// True when the destination was in use and the write should be retried
    pub fn is_locked(&self) -> bool {
        matches!(self, StorageError::DestinationLocked { .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => {
                Some("Free up disk space and try again.")
            }
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StorageError::DestinationLocked { .. } => {
                Some("Close any program that has the data file open (a spreadsheet, for example) and run the command again.")
            }
            StorageError::InvalidFormat { .. } => {
                Some("Fix the file by hand or restore a backup with `kvault restore`.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    // Check error message for disk full indicators
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Check if a rename failed because the destination is open elsewhere
///
/// Only Windows reports this distinctly, as a sharing (32) or lock (33)
/// violation.
fn is_lock_error(error: &io::Error) -> bool {
    cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_not_found_classification() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StorageError::from_io(io_err, PathBuf::from("/missing/file"));

        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_disk_full_detection() {
        let io_err = io::Error::new(io::ErrorKind::Other, "No space left on device");
        let err = StorageError::from_io(io_err, PathBuf::from("/full/disk"));

        assert!(matches!(err, StorageError::DiskFull { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_denied_rename_is_not_reported_as_locked() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only directory");
        let err = StorageError::from_rename(
            io_err,
            PathBuf::from("/data/knowledge_data.csv.tmp"),
            PathBuf::from("/data/knowledge_data.csv"),
        );

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(!err.is_locked());
        assert!(!err.to_string().contains("in use by another program"));
        assert!(err.recovery_suggestion().unwrap().contains("permissions"));
    }

    #[cfg(windows)]
    #[test]
    fn test_sharing_violation_rename_is_locked() {
        let err = StorageError::from_rename(
            io::Error::from_raw_os_error(32),
            PathBuf::from("/data/knowledge_data.csv.tmp"),
            PathBuf::from("/data/knowledge_data.csv"),
        );

        assert!(err.is_locked());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("in use by another program"));
        assert!(err.recovery_suggestion().unwrap().contains("Close"));
    }

    #[test]
    fn test_locked_error_display() {
        let err = StorageError::DestinationLocked {
            path: PathBuf::from("/data/knowledge_data.csv"),
            source: io::Error::new(io::ErrorKind::Other, "in use"),
        };

        assert!(err.is_locked());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("in use by another program"));
        assert!(err.recovery_suggestion().unwrap().contains("Close"));
    }

    #[test]
    fn test_other_rename_failure() {
        let io_err = io::Error::new(io::ErrorKind::Other, "cross-device link");
        let err = StorageError::from_rename(
            io_err,
            PathBuf::from("/a.tmp"),
            PathBuf::from("/b"),
        );

        assert!(matches!(err, StorageError::AtomicWriteFailed { .. }));
        assert!(!err.is_locked());
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::PermissionDenied {
            path: PathBuf::from("/test/file"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let msg = err.to_string();
        assert!(msg.contains("Permission denied"));
        assert!(msg.contains("/test/file"));
    }

    #[test]
    fn test_invalid_format_display() {
        let err = StorageError::InvalidFormat {
            path: PathBuf::from("/data/knowledge_data.csv"),
            details: "unequal row lengths".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("Invalid data"));
        assert!(msg.contains("unequal row lengths"));
        assert!(!err.is_recoverable());
    }
}
