//! Storage backends for the event log
//!
//! This crate implements the EventStorage port:
//! - MemoryEventStorage: BTreeMap-based storage with RwLock
//! - NullEventStorage: the placeholder for engines without a backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod null;

pub use memory::MemoryEventStorage;
pub use null::NullEventStorage;
