//! Concurrency layer for the event log
//!
//! This crate implements optimistic concurrency control around the commit
//! sequence counter:
//! - Exclusion: the two mutual-exclusion disciplines behind one protocol
//! - StreamVersionIndex: incremental highest-version-per-stream bookkeeping
//! - Transaction: submission buffering, version resolution, commit retry
//! - CommitTarget: the seam between transactions and an engine

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod exclusion;
pub mod transaction;
pub mod version_index;

// Re-export commonly used types and traits
pub use exclusion::{Exclusion, MutexExclusion, ThreadConfined};
pub use transaction::{CommitOutcome, CommitTarget, RetryPolicy, Transaction};
pub use version_index::StreamVersionIndex;
