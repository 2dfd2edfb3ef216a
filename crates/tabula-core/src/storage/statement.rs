//! Rendered SQL statements
//!
//! A [`Statement`] is a complete unit of work for the database: SQL text,
//! bound parameters, and the lock class it needs. Statements are plain data
//! so they can be moved onto a blocking worker thread.

use rusqlite::{params_from_iter, Connection};

use crate::record::Record;
use crate::value::Value;

/// Lock class a statement needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// May run alongside other reads
    Read,
    /// Excludes every other statement
    Write,
}

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub access: Access,
    /// Names given to result columns, in order; empty unless the statement
    /// returns rows
    pub columns: Vec<String>,
}

impl Statement {
    pub fn read(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            access: Access::Read,
            columns: Vec::new(),
        }
    }

    pub fn write(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            access: Access::Write,
            columns: Vec::new(),
        }
    }

    /// Name the result columns for [`Statement::query`]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Execute, returning the number of affected rows
    pub fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(&self.sql, params_from_iter(self.params.iter()))
    }

    /// Execute an `INSERT`, returning the new row id
    ///
    /// `None` when nothing was inserted.
    pub fn insert(&self, conn: &Connection) -> rusqlite::Result<Option<i64>> {
        let changed = self.execute(conn)?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Run a query and collect every row as a [`Record`]
    pub fn query(&self, conn: &Connection) -> rusqlite::Result<Vec<Record>> {
        let mut stmt = conn.prepare(&self.sql)?;
        let rows = stmt.query_map(params_from_iter(self.params.iter()), |row| {
            let mut record = Record::new();
            for (i, name) in self.columns.iter().enumerate() {
                record.insert(name.as_str(), row.get::<_, Value>(i)?);
            }
            Ok(record)
        })?;
        rows.collect()
    }

    /// Run a query returning a single integer
    pub fn query_i64(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })
    }
}
