//! Crate-level error type
//!
//! Groups the three failure families:
//! - [`SchemaError`]: the table definition itself is unusable
//! - [`ValidationError`]: a record does not fit the schema (nothing was run)
//! - [`StorageError`]: SQLite rejected or failed the statement

use thiserror::Error;

use crate::engine::ValidationError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err))
    }
}

impl Error {
    /// Whether the caller can fix its input and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Validation(_) => true,
            Error::Storage(err) => err.is_constraint_violation() || err.is_busy(),
            Error::Schema(_) => false,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::Storage(err) if err.is_constraint_violation())
    }
}

/// Result type for table operations
pub type Result<T> = std::result::Result<T, Error>;
