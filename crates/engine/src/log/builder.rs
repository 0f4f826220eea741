//! Event log builder for fluent configuration
//!
//! Provides a builder pattern for configuring and opening logs with either
//! concurrency discipline.

use factlog_concurrency::RetryPolicy;
use factlog_core::error::Result;
use factlog_core::event::EventSet;
use factlog_core::traits::EventStorage;
use factlog_storage::NullEventStorage;
use std::sync::Arc;

use super::{ConcurrentEventLog, EventLog, SingleThreadEventLog};

// ============================================================================
// Event Log Builder
// ============================================================================

/// Builder for event log configuration
///
/// The concurrency discipline is chosen last, by the open method: [`open`]
/// for the thread-safe log, [`open_local`] for the thread-confined one.
///
/// # Three Ways to Open a Log
///
/// ```ignore
/// use factlog_engine::{ConcurrentEventLog, EventLogBuilder};
/// use factlog_storage::MemoryEventStorage;
/// use std::sync::Arc;
///
/// // 1. Simple open with default retries
/// let log = ConcurrentEventLog::open(Arc::new(MemoryEventStorage::new()))?;
///
/// // 2. Builder for retry tuning and preloading
/// let log = EventLogBuilder::new()
///     .storage(Arc::new(MemoryEventStorage::new()))
///     .retry_policy(RetryPolicy::new().with_max_attempts(5))
///     .open()?;
///
/// // 3. Thread-confined, no locking
/// let log = EventLogBuilder::new()
///     .storage(Arc::new(MemoryEventStorage::new()))
///     .open_local()?;
/// ```
///
/// Without a configured backend the log opens over [`NullEventStorage`]: it
/// reads as empty and every commit fails, which suits wiring tests and
/// disconnected standins.
///
/// [`open`]: EventLogBuilder::open
/// [`open_local`]: EventLogBuilder::open_local
pub struct EventLogBuilder<E> {
    storage: Option<Arc<dyn EventStorage<E>>>,
    retry: RetryPolicy,
    preload: Vec<EventSet<E>>,
}

impl<E> EventLogBuilder<E> {
    /// Create a new builder with default retries and no backend
    pub fn new() -> Self {
        Self {
            storage: None,
            retry: RetryPolicy::default(),
            preload: Vec::new(),
        }
    }

    /// Set the storage backend
    pub fn storage(mut self, storage: Arc<dyn EventStorage<E>>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the commit retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Seed the log with sets committed before it is returned
    ///
    /// Each set receives a fresh commit id after the backend's existing
    /// history; stream versions are taken as stored. Used to move history
    /// between logs.
    pub fn preload(mut self, sets: Vec<EventSet<E>>) -> Self {
        self.preload = sets;
        self
    }

    /// Open the thread-safe log
    ///
    /// # Errors
    ///
    /// Propagates backend failures reading existing history or appending a
    /// preloaded set.
    pub fn open(self) -> Result<ConcurrentEventLog<E>> {
        let (storage, retry, preload) = self.into_parts();
        EventLog::with_options(storage, retry, preload)
    }

    /// Open the thread-confined log
    ///
    /// The log binds to the first thread that starts a transaction, not to
    /// the thread that opened it.
    ///
    /// # Errors
    ///
    /// Propagates backend failures reading existing history or appending a
    /// preloaded set.
    pub fn open_local(self) -> Result<SingleThreadEventLog<E>> {
        let (storage, retry, preload) = self.into_parts();
        EventLog::with_options(storage, retry, preload)
    }

    fn into_parts(self) -> (Arc<dyn EventStorage<E>>, RetryPolicy, Vec<EventSet<E>>) {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(NullEventStorage));
        (storage, self.retry, self.preload)
    }
}

impl<E> Default for EventLogBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
