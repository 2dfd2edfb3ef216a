//! Blocking table engine
//!
//! [`Table`] can be shared between threads (wrap it in an `Arc`). Every call
//! takes the engine's reader/writer lock for its whole duration: queries in
//! shared mode, everything else in exclusive mode. A SQLite connection can
//! only run one statement at a time, so readers additionally take turns on
//! the connection slot while a statement executes.

use std::sync::{Mutex, PoisonError};

use rusqlite::Connection;
use tracing::{debug, info};

use super::shared::TableCore;
use crate::error::Result;
use crate::record::{Record, ID_FIELD};
use crate::schema::Schema;
use crate::storage::{Access, DbPath, ReadWriteLock, Statement};

/// Schema-bound table backed by one lazily opened connection
pub struct Table {
    core: TableCore,
    db: DbPath,
    lock: ReadWriteLock,
    conn: Mutex<Option<Connection>>,
}

impl Table {
    /// Bind to `db` and create the table if it does not exist
    pub(crate) fn open(core: TableCore, db: DbPath) -> Result<Self> {
        let table = Self {
            core,
            db,
            lock: ReadWriteLock::new(),
            conn: Mutex::new(None),
        };
        table.create_table()?;
        Ok(table)
    }

    /// Logical name the table was built under
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Physical table name
    pub fn table_name(&self) -> &str {
        self.core.table_name()
    }

    pub fn schema(&self) -> &Schema {
        self.core.schema()
    }

    pub fn db_path(&self) -> &DbPath {
        &self.db
    }

    /// Create the table if it does not exist
    ///
    /// An existing table is left untouched, whatever its structure.
    pub fn create_table(&self) -> Result<()> {
        let stmt = self.core.create_table();
        self.run(&stmt, |stmt, conn| stmt.execute(conn))?;
        info!("Ensured table {} exists", self.table_name());
        Ok(())
    }

    /// Add a record; its keys must match the schema exactly
    ///
    /// Returns the assigned id.
    pub fn add(&self, record: &Record) -> Result<Option<i64>> {
        let stmt = self.core.insert(record)?;
        self.run(&stmt, |stmt, conn| stmt.insert(conn))
    }

    /// Delete by id; a missing id is not an error
    pub fn delete(&self, id: i64) -> Result<()> {
        let stmt = self.core.delete(id);
        self.run(&stmt, |stmt, conn| stmt.execute(conn))?;
        Ok(())
    }

    /// Change some fields of a record
    pub fn modify(&self, id: i64, changes: &Record) -> Result<()> {
        let Some(stmt) = self.core.update(id, changes)? else {
            return Ok(());
        };
        self.run(&stmt, |stmt, conn| stmt.execute(conn))?;
        Ok(())
    }

    /// Find records matching every filter; no filters returns everything
    pub fn search(&self, filters: &Record, fuzzy: bool) -> Result<Vec<Record>> {
        let stmt = self.core.select(filters, fuzzy)?;
        self.run(&stmt, |stmt, conn| stmt.query(conn))
    }

    /// Fetch a single record by id
    pub fn get(&self, id: i64) -> Result<Option<Record>> {
        let filters = Record::new().with(ID_FIELD, id);
        Ok(self.search(&filters, false)?.into_iter().next())
    }

    pub fn count(&self) -> Result<i64> {
        let stmt = self.core.count();
        self.run(&stmt, |stmt, conn| stmt.query_i64(conn))
    }

    /// Compact the database file
    pub fn vacuum(&self) -> Result<()> {
        let stmt = self.core.vacuum();
        self.run(&stmt, |stmt, conn| stmt.execute(conn))?;
        info!("Vacuumed {}", self.db);
        Ok(())
    }

    /// Drop the connection; the next call reopens it
    pub fn close(&self) {
        let _guard = self.lock.write_lock();
        let mut slot = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            info!("Closed connection to {}", self.db);
        }
    }

    fn run<T>(
        &self,
        stmt: &Statement,
        f: impl FnOnce(&Statement, &Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        match stmt.access {
            Access::Read => {
                let _guard = self.lock.read_lock();
                self.execute(stmt, f)
            }
            Access::Write => {
                let _guard = self.lock.write_lock();
                self.execute(stmt, f)
            }
        }
    }

    fn execute<T>(
        &self,
        stmt: &Statement,
        f: impl FnOnce(&Statement, &Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut slot = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = match slot.take() {
            Some(conn) => conn,
            None => self.db.open()?,
        };

        debug!(table = %self.table_name(), "{}", stmt.sql);
        let result = f(stmt, &conn);
        *slot = Some(conn);
        Ok(result?)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("table_name", &self.table_name())
            .field("db", &self.db)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn notes_table(db: DbPath) -> Table {
        let schema = Schema::from_field_map([("body", PrimitiveType::Text)]).unwrap();
        let core = TableCore::new("Notes".into(), "notes".into(), Arc::new(schema));
        Table::open(core, db).unwrap()
    }

    fn count_directly(path: &std::path::Path) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_writer_waits_for_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let table = Arc::new(notes_table(DbPath::from(path.clone())));
        let added = Arc::new(AtomicBool::new(false));

        // Stand in for an in-flight search
        let read_guard = table.lock.read_lock();

        let writer = {
            let table = table.clone();
            let added = added.clone();
            thread::spawn(move || {
                table.add(&Record::new().with("body", "later")).unwrap();
                added.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!added.load(Ordering::SeqCst));
        assert_eq!(count_directly(&path), 0);

        drop(read_guard);
        writer.join().unwrap();
        assert!(added.load(Ordering::SeqCst));
        assert_eq!(count_directly(&path), 1);
    }

    #[test]
    fn test_close_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let table = notes_table(DbPath::from(dir.path().join("notes.db")));

        let id = table.add(&Record::new().with("body", "one")).unwrap();
        table.close();
        assert!(table.conn.lock().unwrap().is_none());

        let found = table.get(id.unwrap()).unwrap().unwrap();
        assert_eq!(found.get("body"), Some(&"one".into()));
        assert!(table.conn.lock().unwrap().is_some());
    }

    #[test]
    fn test_connection_reused_between_calls() {
        let table = notes_table(DbPath::Memory);
        table.add(&Record::new().with("body", "kept")).unwrap();
        // An in-memory database only survives if the same connection is reused
        assert_eq!(table.count().unwrap(), 1);
    }
}
