//! Table engines
//!
//! Both engines share [`TableCore`] for validation and SQL rendering and
//! only differ in how access to their connection is serialized:
//!
//! - [`Table`]: blocking, reader/writer locked, shareable across threads
//! - [`AsyncTable`]: async, calls queued on a tokio mutex, statements run on
//!   the blocking pool

mod blocking;
mod cooperative;
mod shared;

pub use blocking::Table;
pub use cooperative::AsyncTable;
pub use shared::{validate_keys, KeyDiff, TableCore, ValidationError};
