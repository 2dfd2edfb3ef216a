//! Reader/writer lock for the blocking table engine
//!
//! Many readers or one writer, never both. Statements are atomic, so a
//! holder that panics cannot leave a half-applied change behind; poisoned
//! locks are recovered instead of propagating the panic to every later
//! caller.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Guard held while reading
pub type ReadGuard<'a> = RwLockReadGuard<'a, ()>;

/// Guard held while writing
pub type WriteGuard<'a> = RwLockWriteGuard<'a, ()>;

#[derive(Debug, Default)]
pub struct ReadWriteLock {
    inner: RwLock<()>,
}

impl ReadWriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared access, blocking while a writer holds the lock
    pub fn read_lock(&self) -> ReadGuard<'_> {
        self.inner.read().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned read lock");
            poisoned.into_inner()
        })
    }

    /// Acquire exclusive access, blocking while anyone holds the lock
    pub fn write_lock(&self) -> WriteGuard<'_> {
        self.inner.write().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned write lock");
            poisoned.into_inner()
        })
    }
}
