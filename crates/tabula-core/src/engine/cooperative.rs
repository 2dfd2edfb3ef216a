//! Async table engine
//!
//! [`AsyncTable`] serializes every call through an async mutex; waiting
//! callers queue up in FIFO order without blocking the runtime. Opening the
//! connection and running statements happen on tokio's blocking pool, so
//! those awaits are the only suspension points.
//!
//! The connection slot is shared with the worker, never moved into it. A
//! call dropped mid-flight still finishes on the worker and leaves the
//! connection in place; the next call waits on the slot until it does.
//!
//! Nothing touches the database until [`AsyncTable::activate`] is called.
//!
//! ```no_run
//! # async fn demo() -> tabula_core::Result<()> {
//! use tabula_core::{PrimitiveType, Record, TableFactory};
//!
//! let books = TableFactory::new([("title", PrimitiveType::Text)], "BookDB")?
//!     .with_table_name("books")?;
//! let db = books.open_async("./books.db");
//! db.activate().await?;
//!
//! let id = db.add(&Record::new().with("title", "Dune")).await?;
//! let hits = db.search(&Record::new().with("title", "un"), true).await?;
//! assert_eq!(hits[0].id(), id);
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;
use tokio::task::{self, JoinError};
use tracing::{debug, info, warn};

use super::shared::TableCore;
use crate::error::Result;
use crate::record::{Record, ID_FIELD};
use crate::schema::Schema;
use crate::storage::{DbPath, Statement, StorageError};

/// Schema-bound table for use from async code
pub struct AsyncTable {
    core: TableCore,
    db: DbPath,
    queue: tokio::sync::Mutex<()>,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl AsyncTable {
    pub(crate) fn new(core: TableCore, db: DbPath) -> Self {
        Self {
            core,
            db,
            queue: tokio::sync::Mutex::new(()),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn table_name(&self) -> &str {
        self.core.table_name()
    }

    pub fn schema(&self) -> &Schema {
        self.core.schema()
    }

    pub fn db_path(&self) -> &DbPath {
        &self.db
    }

    /// Open the connection and create the table if needed
    pub async fn activate(&self) -> Result<()> {
        self.create_table().await
    }

    /// Create the table if it does not exist
    pub async fn create_table(&self) -> Result<()> {
        let stmt = self.core.create_table();
        self.run(stmt, |stmt, conn| stmt.execute(conn)).await?;
        info!("Ensured table {} exists", self.table_name());
        Ok(())
    }

    /// Add a record; its keys must match the schema exactly
    pub async fn add(&self, record: &Record) -> Result<Option<i64>> {
        let stmt = self.core.insert(record)?;
        self.run(stmt, |stmt, conn| stmt.insert(conn)).await
    }

    /// Delete by id; a missing id is not an error
    pub async fn delete(&self, id: i64) -> Result<()> {
        let stmt = self.core.delete(id);
        self.run(stmt, |stmt, conn| stmt.execute(conn)).await?;
        Ok(())
    }

    pub async fn modify(&self, id: i64, changes: &Record) -> Result<()> {
        let Some(stmt) = self.core.update(id, changes)? else {
            return Ok(());
        };
        self.run(stmt, |stmt, conn| stmt.execute(conn)).await?;
        Ok(())
    }

    pub async fn search(&self, filters: &Record, fuzzy: bool) -> Result<Vec<Record>> {
        let stmt = self.core.select(filters, fuzzy)?;
        self.run(stmt, |stmt, conn| stmt.query(conn)).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Record>> {
        let filters = Record::new().with(ID_FIELD, id);
        Ok(self.search(&filters, false).await?.into_iter().next())
    }

    pub async fn count(&self) -> Result<i64> {
        let stmt = self.core.count();
        self.run(stmt, |stmt, conn| stmt.query_i64(conn)).await
    }

    pub async fn vacuum(&self) -> Result<()> {
        let stmt = self.core.vacuum();
        self.run(stmt, |stmt, conn| stmt.execute(conn)).await?;
        info!("Vacuumed {}", self.db);
        Ok(())
    }

    /// Drop the connection; the next call reopens it
    pub async fn close(&self) {
        let _queue = self.queue.lock().await;
        let conn = Arc::clone(&self.conn);
        let closed = task::spawn_blocking(move || {
            conn.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .is_some()
        })
        .await;

        match closed {
            Ok(true) => info!("Closed connection to {}", self.db),
            Ok(false) => {}
            Err(err) => {
                worker_failed(err);
            }
        }
    }

    async fn run<T, F>(&self, stmt: Statement, f: F) -> Result<T>
    where
        F: FnOnce(&Statement, &Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _queue = self.queue.lock().await;
        debug!(table = %self.table_name(), "{}", stmt.sql);

        let conn = Arc::clone(&self.conn);
        let db = self.db.clone();
        task::spawn_blocking(move || -> Result<T> {
            let mut slot = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let conn = match slot.take() {
                Some(conn) => conn,
                None => db.open()?,
            };
            let conn = slot.insert(conn);
            Ok(f(&stmt, conn)?)
        })
        .await
        .map_err(worker_failed)?
    }
}

fn worker_failed(err: JoinError) -> StorageError {
    warn!("Storage worker failed: {}", err);
    StorageError::Worker(err.to_string())
}

impl std::fmt::Debug for AsyncTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncTable")
            .field("name", &self.name())
            .field("table_name", &self.table_name())
            .field("db", &self.db)
            .finish()
    }
}
