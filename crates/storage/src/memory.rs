//! MemoryEventStorage: in-memory storage backend
//!
//! This module implements the EventStorage trait using:
//! - `BTreeMap<i64, Arc<EventSet<E>>>` for ordered commit storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Sets shared, never copied**: `add` wraps each set in an `Arc` once;
//!   every read hands out a clone of that pointer
//! - **Ascending enumeration for free**: the BTreeMap keeps commits ordered,
//!   so `all` needs no sort
//! - **Occupancy checked under the write lock**: duplicate commit ids are
//!   rejected without disturbing the stored set

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use factlog_core::error::{Error, Result};
use factlog_core::event::EventSet;
use factlog_core::traits::EventStorage;

/// In-memory event storage backed by a BTreeMap under an RwLock
pub struct MemoryEventStorage<E> {
    sets: RwLock<BTreeMap<i64, Arc<EventSet<E>>>>,
}

impl<E> MemoryEventStorage<E> {
    /// Create a new empty MemoryEventStorage
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored commits
    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    /// Whether no commit has been stored
    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }
}

impl<E> Default for MemoryEventStorage<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync> EventStorage<E> for MemoryEventStorage<E> {
    fn add(&self, set: EventSet<E>) -> Result<()> {
        let commit = set.commit();
        let mut sets = self.sets.write();
        match sets.entry(commit) {
            Entry::Occupied(_) => Err(Error::DuplicateCommit(commit)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(set));
                Ok(())
            }
        }
    }

    fn get(&self, commit: i64) -> Result<Arc<EventSet<E>>> {
        self.sets
            .read()
            .get(&commit)
            .cloned()
            .ok_or(Error::MissingCommit(commit))
    }

    fn all(&self) -> Result<Vec<Arc<EventSet<E>>>> {
        Ok(self.sets.read().values().cloned().collect())
    }

    fn last_commit(&self) -> Result<Option<i64>> {
        Ok(self.sets.read().keys().next_back().copied())
    }
}
