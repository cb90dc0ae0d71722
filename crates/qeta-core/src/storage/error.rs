//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.
//!
//! A missing entity and a caller who is not the recorded author are *not*
//! errors. Store operations report both as `Ok(None)` or `Ok(false)`, and the
//! two cases are indistinguishable at this layer. The API layer has already
//! checked permissions, so such a result should be presented as "not found".
//! Only malformed input and failures of the database itself surface as
//! [`StorageError`], and they abort the operation's transaction.

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

    /// SQLite database error (includes constraint violations)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Vote weight outside of -1..=1
    #[error("Invalid vote score {score}: votes must be -1, 0 or 1")]
    InvalidVote { score: i32 },

    /// Attachment parameters do not match the location type
    #[error("Invalid attachment '{uuid}': {details}")]
    InvalidAttachment { uuid: String, details: String },

    /// Another thread panicked while holding the connection
    #[error("Database connection lock is poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Create an error from an I/O error raised while preparing `path`
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::DiskFull { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::InvalidVote { .. }
                | StorageError::InvalidAttachment { .. }
        )
    }

    /// Check if this error is a violated database constraint
    /// (unknown attachment id, duplicate attachment uuid, ...)
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StorageError::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::InvalidVote { .. } => Some("Vote with -1, 0 or 1."),
            StorageError::InvalidAttachment { .. } => Some(
                "Database attachments need binary content; external attachments must not carry any.",
            ),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
