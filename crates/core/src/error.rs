//! Error types for the event log
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! A conflicting commit attempt is not represented here: the commit protocol
//! models token conflicts as an ordinary outcome and retries them. Only
//! permanent failures cross the public boundary as errors.

use crate::types::StreamId;
use std::thread::ThreadId;
use thiserror::Error;

/// Result type alias for event log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the event log
#[derive(Debug, Error)]
pub enum Error {
    /// An explicit stream version lagged behind the committed stream state.
    /// Permanent: retrying cannot make a stale version acceptable.
    #[error(
        "version conflict on stream {stream}: supplied {supplied}, next expected {expected}"
    )]
    VersionConflict {
        /// Stream the conflicting submission targeted
        stream: StreamId,
        /// Version the caller supplied
        supplied: i64,
        /// Lowest version the stream would have accepted
        expected: i64,
    },

    /// Every commit attempt lost the token race
    #[error("commit abandoned after {attempts} conflicting attempts")]
    CommitExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Applying a batch failed for a reason other than a token conflict
    #[error("commit could not be executed")]
    CommitFailed {
        /// Underlying failure reported by the storage backend
        #[source]
        source: Box<Error>,
    },

    /// A thread-confined log was used from a thread other than its owner
    #[error("log is bound to thread {bound:?} but was called from {current:?}")]
    WrongThread {
        /// Thread the log bound itself to on first use
        bound: ThreadId,
        /// Thread that made the offending call
        current: ThreadId,
    },

    /// Storage already holds a set under this commit id
    #[error("commit {0} already present in storage")]
    DuplicateCommit(i64),

    /// Storage holds no set under this commit id
    #[error("commit {0} not found in storage")]
    MissingCommit(i64),

    /// Operation requires a storage backend but none is connected
    #[error("no event storage connected")]
    NoStorage,

    /// Waiting on a deferred result exceeded its deadline
    #[error("timed out waiting for a deferred result")]
    Timeout,

    /// The producing side of a deferred result was dropped before completing
    #[error("deferred result abandoned before completion")]
    Abandoned,
}

impl Error {
    /// Check if this is a per-stream version conflict
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }

    /// Check if this commit gave up after exhausting its retry budget
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::CommitExhausted { .. })
    }

    /// Check if this is a fail-fast misuse of the API rather than a runtime
    /// condition
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::WrongThread { .. })
    }
}
