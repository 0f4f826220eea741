//! Log Lifecycle Tests
//!
//! The commit counter, range retrieval, and reopening over existing history.

use crate::common::{all_sets, commit_batch, open_memory_log, open_over};
use chrono::Utc;
use factlog_core::types::StreamId;
use factlog_engine::ConcurrentEventLog;
use factlog_storage::MemoryEventStorage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Empty Log
// ============================================================================

#[test]
fn empty_log_starts_at_minus_one() {
    let log = open_memory_log();
    assert_eq!(log.last_transaction(), -1);
    assert_eq!(log.commits(i64::MIN, i64::MAX).count(), 0);
    assert_eq!(log.commits(0, 0).count(), 0);
}

#[test]
fn counter_advances_by_one_per_commit() {
    let log = open_memory_log();
    let stream = StreamId::new();

    for expected in 0..5 {
        let commit = commit_batch(&log, stream, &["payload"]);
        assert_eq!(commit, expected);
        assert_eq!(log.last_transaction(), expected);
    }
}

// ============================================================================
// Batch Semantics
// ============================================================================

#[test]
fn one_transaction_shares_one_commit_id() {
    let log = open_memory_log();
    let stream = StreamId::new();

    let commit = commit_batch(&log, stream, &["a", "b", "c"]);
    assert_eq!(commit, 0);

    let sets = all_sets(&log);
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].commit(), 0);
    assert_eq!(sets[0].len(), 3);
    let versions: Vec<i64> = sets[0].iter().map(|e| e.stream_version()).collect();
    assert_eq!(versions, vec![0, 1, 2]);
}

#[test]
fn empty_transaction_occupies_a_commit_id() {
    let log = open_memory_log();

    let txn = log.start_transaction().unwrap();
    assert_eq!(txn.commit().wait().unwrap(), 0);
    assert_eq!(log.last_transaction(), 0);

    let sets = all_sets(&log);
    assert!(sets[0].is_empty());

    // The next commit numbers after the empty one.
    assert_eq!(commit_batch(&log, StreamId::new(), &["next"]), 1);
}

#[test]
fn envelopes_carry_the_transaction_identity() {
    let log = open_memory_log();
    let stream = StreamId::new();

    let mut txn = log.start_transaction().unwrap();
    let id = txn.id();
    txn.store("a".to_string(), "created", stream);
    txn.store("b".to_string(), "updated", stream);
    txn.commit().wait().unwrap();

    let sets = all_sets(&log);
    for envelope in sets[0].iter() {
        assert_eq!(envelope.header.transaction, id);
    }
    assert_eq!(sets[0].envelopes()[0].header.discriminator, "created");
    assert_eq!(sets[0].envelopes()[1].header.discriminator, "updated");
}

#[test]
fn envelopes_are_stamped_at_submission_time() {
    let log = open_memory_log();

    let before = Utc::now();
    commit_batch(&log, StreamId::new(), &["a"]);
    let after = Utc::now();

    let stamped = all_sets(&log)[0].envelopes()[0].header.timestamp;
    assert!(before <= stamped && stamped <= after);
}

// ============================================================================
// Range Retrieval
// ============================================================================

#[test]
fn commits_clamps_to_committed_range() {
    let log = open_memory_log();
    let stream = StreamId::new();
    for payload in ["a", "b", "c", "d"] {
        commit_batch(&log, stream, &[payload]);
    }

    let ids = |from, to| -> Vec<i64> {
        log.commits(from, to).map(|s| s.unwrap().commit()).collect()
    };

    assert_eq!(ids(i64::MIN, i64::MAX), vec![0, 1, 2, 3]);
    assert_eq!(ids(1, 2), vec![1, 2]);
    assert_eq!(ids(3, 100), vec![3]);
    assert_eq!(ids(2, 1), Vec::<i64>::new());
    assert_eq!(ids(4, 10), Vec::<i64>::new());
}

#[test]
fn commits_reports_exact_length() {
    let log = open_memory_log();
    let stream = StreamId::new();
    for payload in ["a", "b", "c"] {
        commit_batch(&log, stream, &[payload]);
    }

    let iter = log.commits(0, 2);
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.size_hint(), (3, Some(3)));
    assert_eq!(log.commits(5, 1).len(), 0);
}

// ============================================================================
// Reopening
// ============================================================================

#[test]
fn reopen_continues_counter_and_versions() {
    let storage = Arc::new(MemoryEventStorage::new());
    let stream = StreamId::new();
    {
        let log = open_over(storage.clone());
        commit_batch(&log, stream, &["a", "b"]);
        commit_batch(&log, stream, &["c"]);
    }

    let log = open_over(storage);
    assert_eq!(log.last_transaction(), 1);

    let commit = commit_batch(&log, stream, &["d"]);
    assert_eq!(commit, 2);
    let sets = all_sets(&log);
    assert_eq!(sets[2].envelopes()[0].stream_version(), 3);
}

// ============================================================================
// Typed Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum OrderEvent {
    Placed { sku: String, quantity: u32 },
    Cancelled,
}

#[test]
fn payload_type_is_opaque_to_the_log() {
    let log: ConcurrentEventLog<OrderEvent> =
        ConcurrentEventLog::open(Arc::new(MemoryEventStorage::new())).unwrap();
    let stream = StreamId::new();

    let mut txn = log.start_transaction().unwrap();
    txn.store(
        OrderEvent::Placed {
            sku: "SKU-1".to_string(),
            quantity: 2,
        },
        "order-placed",
        stream,
    );
    txn.store(OrderEvent::Cancelled, "order-cancelled", stream);
    txn.commit().wait().unwrap();

    let set = log.commits(0, 0).next().unwrap().unwrap();
    assert_eq!(
        set.envelopes()[0].payload,
        OrderEvent::Placed {
            sku: "SKU-1".to_string(),
            quantity: 2,
        }
    );
    assert_eq!(set.envelopes()[1].payload, OrderEvent::Cancelled);
}
