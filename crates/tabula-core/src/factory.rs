//! Table factory
//!
//! A [`TableFactory`] is the reusable definition of a table: its schema, a
//! logical name, and the physical table name. It plays the role a generated
//! class would play in a dynamic language; each `open*` call produces a new
//! engine bound to one database.
//!
//! ```no_run
//! use tabula_core::{PrimitiveType, Record, TableFactory};
//!
//! # fn main() -> tabula_core::Result<()> {
//! let books = TableFactory::new(
//!     [("title", PrimitiveType::Text), ("price", PrimitiveType::Real)],
//!     "BookDB",
//! )?
//! .with_table_name("books")?;
//!
//! let db = books.open("./books.db")?;
//! let id = db.add(&Record::new().with("title", "Dune").with("price", 9.99))?;
//! db.modify(id.unwrap(), &Record::new().with("price", 7.5))?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::engine::{AsyncTable, Table, TableCore};
use crate::error::Result;
use crate::schema::{is_identifier, IntoSchema, Schema, SchemaError};
use crate::storage::DbPath;

#[derive(Debug, Clone)]
pub struct TableFactory {
    name: String,
    table_name: String,
    schema: Arc<Schema>,
}

impl TableFactory {
    /// Define a table named `name`, stored in a table of the same name
    ///
    /// `schema` may be a [`Schema`], a list of field specs, or a list of
    /// `(name, type)` pairs.
    pub fn new(
        schema: impl IntoSchema,
        name: impl Into<String>,
    ) -> std::result::Result<Self, SchemaError> {
        let name = name.into();
        let schema = schema.into_schema()?;
        check_table_name(&name)?;

        Ok(Self {
            table_name: name.clone(),
            name,
            schema: Arc::new(schema),
        })
    }

    /// Store the table under a different physical name
    pub fn with_table_name(
        mut self,
        table_name: impl Into<String>,
    ) -> std::result::Result<Self, SchemaError> {
        let table_name = table_name.into();
        check_table_name(&table_name)?;
        self.table_name = table_name;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The `CREATE TABLE` statement engines run for this definition
    pub fn ddl(&self) -> String {
        self.core().create_table().sql
    }

    /// Open a blocking engine; the table is created immediately
    pub fn open(&self, db: impl Into<DbPath>) -> Result<Table> {
        Table::open(self.core(), db.into())
    }

    /// Create an async engine; nothing is opened until it is activated
    pub fn open_async(&self, db: impl Into<DbPath>) -> AsyncTable {
        AsyncTable::new(self.core(), db.into())
    }

    fn core(&self) -> TableCore {
        TableCore::new(
            self.name.clone(),
            self.table_name.clone(),
            Arc::clone(&self.schema),
        )
    }
}

fn check_table_name(name: &str) -> std::result::Result<(), SchemaError> {
    // sqlite_ is reserved by SQLite itself
    if !is_identifier(name) || name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(SchemaError::InvalidTableName(name.to_string()));
    }
    Ok(())
}
