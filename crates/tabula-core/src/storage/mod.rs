//! Storage layer
//!
//! Everything that touches SQLite directly.
//!
//! ## Pieces
//!
//! - **connection**: where the database lives and how connections are opened
//! - **statement**: rendered SQL plus parameters, and how to run it
//! - **rwlock**: the reader/writer lock used by the blocking engine
//! - **error**: storage failures

pub mod connection;
pub mod error;
pub mod rwlock;
pub mod statement;

pub use connection::DbPath;
pub use error::StorageError;
pub use rwlock::ReadWriteLock;
pub use statement::{Access, Statement};
