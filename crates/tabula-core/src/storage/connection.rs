//! Database location and connection opening

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use super::error::StorageError;

/// Where a table's database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbPath {
    /// A database file, created on first open
    File(PathBuf),
    /// A private in-memory database; every reopen starts empty
    Memory,
}

impl DbPath {
    /// Open a new connection
    ///
    /// For files, the parent directory is created if needed.
    pub fn open(&self) -> Result<Connection, StorageError> {
        let conn = match self {
            DbPath::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| {
                        StorageError::CreateDirectory {
                            path: parent.to_path_buf(),
                            source,
                        }
                    })?;
                }
                Connection::open(path)?
            }
            DbPath::Memory => Connection::open_in_memory()?,
        };

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("Opened database {}", self);
        Ok(conn)
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbPath::File(path) => write!(f, "{}", path.display()),
            DbPath::Memory => f.write_str(":memory:"),
        }
    }
}

impl From<PathBuf> for DbPath {
    fn from(path: PathBuf) -> Self {
        DbPath::File(path)
    }
}

impl From<&Path> for DbPath {
    fn from(path: &Path) -> Self {
        DbPath::File(path.to_path_buf())
    }
}

impl From<&str> for DbPath {
    fn from(path: &str) -> Self {
        if path == ":memory:" {
            DbPath::Memory
        } else {
            DbPath::File(PathBuf::from(path))
        }
    }
}
