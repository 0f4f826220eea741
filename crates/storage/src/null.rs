//! NullEventStorage: the backend used when none is connected
//!
//! Engines built without a storage backend get this placeholder. It lets the
//! engine open cleanly on an empty history, but any attempt to read or write
//! actual data fails with [`Error::NoStorage`] so misconfiguration surfaces
//! at the first commit instead of silently dropping events.

use std::sync::Arc;

use factlog_core::error::{Error, Result};
use factlog_core::event::EventSet;
use factlog_core::traits::EventStorage;

/// Placeholder storage that rejects all data operations
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventStorage;

impl NullEventStorage {
    /// Create a NullEventStorage
    pub fn new() -> Self {
        Self
    }
}

impl<E> EventStorage<E> for NullEventStorage {
    fn add(&self, _set: EventSet<E>) -> Result<()> {
        Err(Error::NoStorage)
    }

    fn get(&self, _commit: i64) -> Result<Arc<EventSet<E>>> {
        Err(Error::NoStorage)
    }

    // An unconnected log has an empty history, not a broken one: engines
    // must still open against it.
    fn all(&self) -> Result<Vec<Arc<EventSet<E>>>> {
        Ok(Vec::new())
    }

    fn last_commit(&self) -> Result<Option<i64>> {
        Ok(None)
    }
}
