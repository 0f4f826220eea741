//! Storage abstraction for event log backends
//!
//! This module defines the EventStorage trait that lets the log run against
//! interchangeable backends (in-memory, embedded stores, remote services)
//! without the commit protocol knowing which one is connected.

use crate::error::Result;
use crate::event::EventSet;
use std::sync::Arc;

/// Storage abstraction for committed event sets
///
/// A backend is a map from commit id to the immutable [`EventSet`] committed
/// under it. The engine serializes `add` calls (one in-flight commit at a
/// time), but `get`, `all` and `last_commit` may be called concurrently with
/// each other and with `add`.
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait EventStorage<E>: Send + Sync {
    /// Store a committed set under its commit id
    ///
    /// The set's own commit id is the key. Ids arrive in ascending order with
    /// no gaps; a backend must never overwrite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommit`](crate::Error::DuplicateCommit) if a
    /// set is already stored under this id, or a backend-specific error if
    /// the write fails.
    fn add(&self, set: EventSet<E>) -> Result<()>;

    /// Fetch the set committed under the given id
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCommit`](crate::Error::MissingCommit) if no
    /// set is stored under this id.
    fn get(&self, commit: i64) -> Result<Arc<EventSet<E>>>;

    /// Fetch every stored set, in any order
    ///
    /// Used once at engine construction and on storage switches to rebuild
    /// derived state; never on the commit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot enumerate its sets.
    fn all(&self) -> Result<Vec<Arc<EventSet<E>>>>;

    /// Highest commit id currently stored, or None for an empty backend
    ///
    /// Seeds the engine's commit sequence counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot answer.
    fn last_commit(&self) -> Result<Option<i64>>;
}
