//! Storage error handling
//!
//! Wraps failures reported by SQLite or by the machinery around it
//! (directory creation, background workers) with descriptive messages.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur while talking to the database
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the directory holding the database file
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A background task running a statement panicked or was aborted
    #[error("Storage worker failed: {0}")]
    Worker(String),
}

impl StorageError {
    /// Whether the database rejected the statement because of a constraint
    /// (`UNIQUE`, `NOT NULL`, ...)
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
        )
    }

    /// Whether the database file was busy or locked by another process
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            StorageError::Database(rusqlite::Error::SqliteFailure(err, _))
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ if self.is_constraint_violation() => {
                Some("A unique or required field was violated. Fix the record and try again.")
            }
            _ if self.is_busy() => Some("Another process holds the database. Try again later."),
            _ => None,
        }
    }
}
