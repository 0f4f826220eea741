//! Event log engine: the commit critical section and the public log surface
//!
//! The engine owns the commit sequence counter, the stream version index, and
//! the storage backend, and exposes them through two variants of one type:
//!
//! 1. [`ConcurrentEventLog`]: callers from any thread; the critical section
//!    is a mutex.
//! 2. [`SingleThreadEventLog`]: no lock at all; the log binds to the first
//!    thread that starts a transaction and rejects every other thread.
//!
//! Both share every line of the protocol; the variants differ only in the
//! [`Exclusion`] strategy plugged into the section.
//!
//! ## The critical section
//!
//! One exclusive region covers the whole atomic step: compare the caller's
//! token to the counter, assign the next commit id, append the set to
//! storage, fold the new versions into the index, advance the counter. The
//! published counter mirror is stored last, so a reader that observes commit
//! N also observes the index state for N. Hook ids are queued inside the
//! section (the queue order is the notification order) but delivered only
//! after it releases, so subscribers never block writers.
//!
//! Everything else stays outside the section: buffering submissions, version
//! arithmetic, range reads over already-committed sets, and hook delivery.

mod builder;

pub use builder::EventLogBuilder;

use crate::hooks::HookRegistry;
use factlog_concurrency::{
    CommitOutcome, CommitTarget, Exclusion, MutexExclusion, RetryPolicy, StreamVersionIndex,
    ThreadConfined, Transaction,
};
use factlog_core::error::{Error, Result};
use factlog_core::event::{EventEnvelope, EventSet};
use factlog_core::traits::EventStorage;
use factlog_core::types::{HookId, StreamId};
use parking_lot::RwLock;
use std::mem;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Commit Sequence
// ============================================================================

/// State guarded by the commit critical section
///
/// Holds the last assigned commit id, `-1` while the log is empty. This is
/// the authoritative counter; [`EventLog`] keeps a lock-free mirror of it for
/// readers.
#[derive(Debug)]
pub struct CommitSequence {
    last: i64,
}

// ============================================================================
// Event Log
// ============================================================================

/// Append-only event log with per-stream optimistic concurrency control
///
/// Generic over the payload type `E` and the exclusion strategy `X`. Use the
/// [`ConcurrentEventLog`] and [`SingleThreadEventLog`] aliases, or
/// [`EventLogBuilder`] for preloading and retry tuning.
///
/// # Example
///
/// ```ignore
/// use factlog_engine::ConcurrentEventLog;
/// use factlog_storage::MemoryEventStorage;
/// use std::sync::Arc;
///
/// let log = ConcurrentEventLog::open(Arc::new(MemoryEventStorage::new()))?;
///
/// let mut txn = log.start_transaction()?;
/// txn.store(payload, "order-placed", stream);
/// let commit = txn.commit().wait()?;
///
/// for set in log.commits(0, commit) {
///     println!("{:?}", set?);
/// }
/// ```
pub struct EventLog<E, X> {
    /// The critical-section guard around the authoritative counter
    section: X,

    /// Lock-free mirror of the counter, stored last in the section
    published: AtomicI64,

    /// Highest committed version per stream, folded forward on every commit
    index: RwLock<StreamVersionIndex>,

    /// Storage backend; swapped wholesale by `switch_storage`
    storage: RwLock<Arc<dyn EventStorage<E>>>,

    hooks: HookRegistry,

    retry: RetryPolicy,
}

/// Thread-safe log: commits from any thread serialize on a mutex
pub type ConcurrentEventLog<E> = EventLog<E, MutexExclusion<CommitSequence>>;

/// Lock-free log confined to the first thread that starts a transaction
pub type SingleThreadEventLog<E> = EventLog<E, ThreadConfined<CommitSequence>>;

impl<E> ConcurrentEventLog<E> {
    /// Open a thread-safe log over `storage`
    ///
    /// Seeds the commit counter from the backend's last reported id and
    /// rebuilds the stream version index from its history.
    ///
    /// # Errors
    ///
    /// Propagates backend failures reading the existing history.
    pub fn open(storage: Arc<dyn EventStorage<E>>) -> Result<Self> {
        Self::with_options(storage, RetryPolicy::default(), Vec::new())
    }
}

impl<E> SingleThreadEventLog<E> {
    /// Open a thread-confined log over `storage`
    ///
    /// The log may be built on one thread and moved to its working thread;
    /// it binds to whichever thread first starts a transaction.
    ///
    /// # Errors
    ///
    /// Propagates backend failures reading the existing history.
    pub fn open(storage: Arc<dyn EventStorage<E>>) -> Result<Self> {
        Self::with_options(storage, RetryPolicy::default(), Vec::new())
    }
}

impl<E, X: Exclusion<CommitSequence>> EventLog<E, X> {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Open a log with explicit retry policy and preloaded history
    ///
    /// Preloaded sets are committed in order before the log is returned:
    /// each receives a fresh commit id after the backend's existing history,
    /// while its stream versions are taken as stored. No hooks can observe
    /// preloading since the log has no subscribers yet.
    ///
    /// # Errors
    ///
    /// Propagates backend failures reading the existing history or appending
    /// a preloaded set.
    pub fn with_options(
        storage: Arc<dyn EventStorage<E>>,
        retry: RetryPolicy,
        preload: Vec<EventSet<E>>,
    ) -> Result<Self> {
        let last = storage.last_commit()?.unwrap_or(-1);
        let index = StreamVersionIndex::rebuild(storage.as_ref())?;
        let log = Self {
            section: X::new(CommitSequence { last }),
            published: AtomicI64::new(last),
            index: RwLock::new(index),
            storage: RwLock::new(storage),
            hooks: HookRegistry::new(),
            retry,
        };
        let preloaded = preload.len();
        for set in preload {
            log.commit_step(None, &mut set.into_envelopes())?;
        }
        debug!(
            target: "factlog::log",
            last_commit = log.last_transaction(),
            preloaded,
            "event log opened"
        );
        Ok(log)
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Last assigned commit id, `-1` while the log is empty
    ///
    /// Lock-free; a returned id is fully committed, never partially applied.
    pub fn last_transaction(&self) -> i64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Committed sets with ids in `[max(from, 0), min(to, last_transaction)]`
    ///
    /// Lazy and in ascending commit order. An empty or inverted range yields
    /// an empty iterator; an empty log never errors. Committed sets are
    /// immutable, so the iterator reads them without entering the critical
    /// section.
    pub fn commits(&self, from: i64, to: i64) -> Commits<E> {
        Commits {
            storage: self.storage.read().clone(),
            next: from.max(0),
            end: to.min(self.last_transaction()),
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Start a transaction bound to this log
    ///
    /// The transaction buffers submissions locally; nothing reaches the log
    /// until its `commit`. Dropping it uncommitted leaves no trace.
    ///
    /// # Errors
    ///
    /// [`Error::WrongThread`] on a thread-confined log entered from a thread
    /// other than its owner. The thread-safe log never fails here.
    pub fn start_transaction(&self) -> Result<Transaction<'_, E>> {
        self.section.check_caller()?;
        Ok(Transaction::new(self, self.retry.clone()))
    }

    /// One pass through the critical section
    ///
    /// `check_token` is `None` only while preloading, which also suppresses
    /// hook enqueueing. The index is folded only after the backend accepted
    /// the set; a failed append must leave it untouched.
    fn commit_step(
        &self,
        check_token: Option<i64>,
        batch: &mut Vec<EventEnvelope<E>>,
    ) -> Result<CommitOutcome> {
        self.section.exclusive(|sequence| {
            if let Some(token) = check_token {
                if token != sequence.last {
                    return Ok(CommitOutcome::Conflict);
                }
            }
            let commit = sequence.last + 1;
            let set = EventSet::new(commit, mem::take(batch));
            let touched = set.stream_versions();
            self.storage.read().add(set).map_err(|source| Error::CommitFailed {
                source: Box::new(source),
            })?;
            {
                let mut index = self.index.write();
                for (stream, version) in touched {
                    index.observe(stream, version);
                }
            }
            sequence.last = commit;
            self.published.store(commit, Ordering::SeqCst);
            if check_token.is_some() {
                self.hooks.enqueue(commit);
            }
            Ok(CommitOutcome::Committed(commit))
        })
    }

    // ========================================================================
    // Commit Hooks
    // ========================================================================

    /// Subscribe to successful commits
    ///
    /// The hook receives each new commit id exactly once, in commit order,
    /// after the critical section has released. Registration never affects
    /// commits already in flight.
    pub fn on_commit<F>(&self, hook: F) -> HookId
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        self.hooks.register(hook)
    }

    /// Unsubscribe a hook; false if the id is unknown
    pub fn remove_hook(&self, id: HookId) -> bool {
        self.hooks.remove(id)
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Swap the storage backend, returning the old one
    ///
    /// The counter is reseeded from the new backend's last reported id and
    /// the version index rebuilt from its history, both computed before the
    /// swap so a failing backend leaves the log on its old storage.
    ///
    /// Callers must quiesce writers first. An attempt that captured its
    /// token against the old backend fails its conflict check and retries
    /// against the new one; the narrow exception is a new backend reporting
    /// the same last id, which lets such an attempt land on it directly.
    ///
    /// # Errors
    ///
    /// [`Error::WrongThread`] on a thread-confined log entered from a thread
    /// other than its owner, or the new backend's failure reading history.
    pub fn switch_storage(
        &self,
        storage: Arc<dyn EventStorage<E>>,
    ) -> Result<Arc<dyn EventStorage<E>>> {
        self.section.check_caller()?;
        let last = storage.last_commit()?.unwrap_or(-1);
        let rebuilt = StreamVersionIndex::rebuild(storage.as_ref())?;
        let old = self.section.exclusive(|sequence| {
            let old = mem::replace(&mut *self.storage.write(), storage);
            *self.index.write() = rebuilt;
            sequence.last = last;
            self.published.store(last, Ordering::SeqCst);
            old
        });
        info!(target: "factlog::log", last_commit = last, "storage backend switched");
        Ok(old)
    }
}

impl<E, X: Exclusion<CommitSequence>> CommitTarget<E> for EventLog<E, X> {
    fn commit_token(&self) -> i64 {
        self.published.load(Ordering::SeqCst)
    }

    fn next_expected_version(&self, stream: StreamId) -> i64 {
        self.index.read().next_expected(stream)
    }

    fn attempt_commit(
        &self,
        token: i64,
        batch: &mut Vec<EventEnvelope<E>>,
    ) -> Result<CommitOutcome> {
        let events = batch.len();
        let outcome = self.commit_step(Some(token), batch)?;
        if let CommitOutcome::Committed(commit) = outcome {
            debug!(target: "factlog::log", commit, events, "batch committed");
            self.hooks.drain();
        }
        Ok(outcome)
    }
}

// ============================================================================
// Range Iterator
// ============================================================================

/// Lazy iterator over a clamped range of committed sets
///
/// Holds its own handle to the backend, so it stays valid across a
/// `switch_storage` and keeps reading the history it was opened against.
pub struct Commits<E> {
    storage: Arc<dyn EventStorage<E>>,
    next: i64,
    end: i64,
}

impl<E> Iterator for Commits<E> {
    type Item = Result<Arc<EventSet<E>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let commit = self.next;
        self.next += 1;
        Some(self.storage.get(commit))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.end {
            0
        } else {
            self.end.saturating_sub(self.next).saturating_add(1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl<E> ExactSizeIterator for Commits<E> {}

// ============================================================================
// Tests
// ============================================================================
