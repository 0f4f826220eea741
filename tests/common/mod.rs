//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use factlog_concurrency::RetryPolicy;
use factlog_core::error::Result;
use factlog_core::event::EventSet;
use factlog_core::types::StreamId;
use factlog_engine::{ConcurrentEventLog, EventLogBuilder};
use factlog_storage::MemoryEventStorage;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Open a thread-safe log over fresh in-memory storage.
pub fn open_memory_log() -> ConcurrentEventLog<String> {
    ConcurrentEventLog::open(Arc::new(MemoryEventStorage::new())).unwrap()
}

/// Open a thread-safe log over the given storage handle.
pub fn open_over(storage: Arc<MemoryEventStorage<String>>) -> ConcurrentEventLog<String> {
    ConcurrentEventLog::open(storage).unwrap()
}

/// Open a thread-safe log with a retry budget large enough that commits
/// under heavy contention never exhaust it.
pub fn open_contended(threads: u32, commits_per_thread: u32) -> Arc<ConcurrentEventLog<String>> {
    let attempts = threads * commits_per_thread + 8;
    let log = EventLogBuilder::new()
        .storage(Arc::new(MemoryEventStorage::<String>::new()))
        .retry_policy(RetryPolicy::new().with_max_attempts(attempts))
        .open()
        .unwrap();
    Arc::new(log)
}

/// Commit one transaction carrying `payloads` in order on `stream`.
pub fn commit_batch(log: &ConcurrentEventLog<String>, stream: StreamId, payloads: &[&str]) -> i64 {
    let mut txn = log.start_transaction().unwrap();
    for payload in payloads {
        txn.store((*payload).to_string(), "evt", stream);
    }
    txn.commit().wait().unwrap()
}

/// All committed sets in commit order.
pub fn all_sets(log: &ConcurrentEventLog<String>) -> Vec<Arc<EventSet<String>>> {
    log.commits(0, log.last_transaction())
        .collect::<Result<_>>()
        .unwrap()
}

/// Committed versions per stream, in commit order.
pub fn versions_by_stream(log: &ConcurrentEventLog<String>) -> FxHashMap<StreamId, Vec<i64>> {
    let mut streams: FxHashMap<StreamId, Vec<i64>> = FxHashMap::default();
    for set in all_sets(log) {
        for envelope in set.iter() {
            streams
                .entry(envelope.stream())
                .or_default()
                .push(envelope.stream_version());
        }
    }
    streams
}

/// Assert every stream's committed versions are exactly `0..=max`, in commit
/// order, with no gaps or repeats.
pub fn assert_gap_free(streams: &FxHashMap<StreamId, Vec<i64>>) {
    for (stream, versions) in streams {
        let expected: Vec<i64> = (0..versions.len() as i64).collect();
        assert_eq!(
            versions, &expected,
            "stream {stream} versions are not contiguous from zero"
        );
    }
}
