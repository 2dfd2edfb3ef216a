//! Tabula Core Library
//!
//! Turns a declarative list of fields into a ready-to-use SQLite table with
//! add / delete / modify / search / vacuum operations.
//!
//! # Architecture
//!
//! - **Schema**: ordered, validated field definitions; `id` is implicit
//! - **TableFactory**: binds a schema to a table name and opens engines
//! - **Engines**: [`Table`] (blocking, reader/writer locked) and
//!   [`AsyncTable`] (tokio); both render the same parameterized SQL
//!
//! # Quick Start
//!
//! ```no_run
//! use tabula_core::{PrimitiveType, Record, TableFactory};
//!
//! # fn main() -> tabula_core::Result<()> {
//! let books = TableFactory::new(
//!     [("title", PrimitiveType::Text), ("author", PrimitiveType::Text)],
//!     "books",
//! )?;
//! let db = books.open("./books.db")?;
//!
//! db.add(&Record::new().with("title", "Dune").with("author", "Herbert"))?;
//! let found = db.search(&Record::new().with("title", "Du"), true)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - `schema`: field specs, reserved names, schema validation
//! - `types`: primitive types and their SQLite column types
//! - `factory`: table factory
//! - `engine`: statement rendering and the two engines
//! - `storage`: connections, statements, locking, storage errors
//! - `config`: configuration file and environment

pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod record;
pub mod schema;
pub mod storage;
pub mod types;
pub mod value;

pub use config::{Config, TableConfig};
pub use engine::{validate_keys, AsyncTable, KeyDiff, Table, ValidationError};
pub use error::{Error, Result};
pub use factory::TableFactory;
pub use record::{Record, ID_FIELD};
pub use schema::{FieldSpec, IntoSchema, Schema, SchemaError, RESERVED_NAMES};
pub use storage::{DbPath, StorageError};
pub use types::{storage_type, PrimitiveType};
pub use value::Value;
