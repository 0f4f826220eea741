//! Event log engine
//!
//! This crate orchestrates the lower layers:
//! - EventLog: the commit critical section behind two concurrency variants
//! - EventLogBuilder: retry tuning and history preloading
//! - HookRegistry: ordered, non-blocking commit notification
//!
//! The engine is the only component that knows about:
//! - The commit sequence counter and its published mirror
//! - Cross-layer coordination (storage append + version index fold)
//! - Storage backend swaps

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hooks;
pub mod log;

pub use hooks::HookRegistry;
pub use log::{
    CommitSequence, Commits, ConcurrentEventLog, EventLog, EventLogBuilder, SingleThreadEventLog,
};
