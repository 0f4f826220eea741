//! Core types and traits for the event log
//!
//! This crate defines the foundational pieces shared by every layer:
//! - StreamId / TransactionId / HookId: identifier newtypes
//! - EventHeader / EventEnvelope / EventSet: the immutable record model
//! - Error / Result: error type hierarchy
//! - EventStorage: the pluggable backend trait
//! - Completion / Deferred: one-shot deferred commit results

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod deferred;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use deferred::{deferred, Completion, Deferred, DEFAULT_WAIT};
pub use error::{Error, Result};
pub use event::{EventEnvelope, EventHeader, EventSet};
pub use traits::EventStorage;
pub use types::{HookId, StreamId, TransactionId};
