//! FactLog - Embeddable append-only event log with optimistic concurrency
//!
//! FactLog stores batches of domain events as immutable, globally numbered
//! commits. Within a stream, events carry gap-free, zero-based versions;
//! write-write conflicts are detected at commit time and retried against
//! fresh state rather than locked in advance.
//!
//! # Quick Start
//!
//! ```ignore
//! use factlog::{ConcurrentEventLog, MemoryEventStorage, StreamId};
//! use std::sync::Arc;
//!
//! // Open a log over in-memory storage
//! let log = ConcurrentEventLog::open(Arc::new(MemoryEventStorage::new()))?;
//! let stream = StreamId::new();
//!
//! // Buffer events, then commit them atomically
//! let mut txn = log.start_transaction()?;
//! txn.store("order placed", "order-placed", stream);
//! let commit = txn.commit().wait()?;
//!
//! // Read committed history back
//! for set in log.commits(0, commit) {
//!     println!("{:?}", set?.commit());
//! }
//! ```
//!
//! # Architecture
//!
//! The log engine owns the commit sequence counter and the per-stream
//! version index; transactions drive its atomic commit step through a
//! bounded retry loop. Storage is a pluggable port; the engine never
//! assumes more than keyed append and retrieval.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export the public API from the member crates
pub use factlog_concurrency::*;
pub use factlog_core::*;
pub use factlog_engine::*;
pub use factlog_storage::*;
