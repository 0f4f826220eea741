//! Commit Hook Tests
//!
//! Notification fires exactly once per successful commit, after the commit
//! is readable, and never for failed attempts.

use crate::common::{commit_batch, open_memory_log};
use factlog_core::types::StreamId;
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn hook_receives_each_commit_id_once_in_order() {
    let log = open_memory_log();
    let stream = StreamId::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    log.on_commit(move |commit| sink.lock().push(commit));

    for payload in ["a", "b", "c"] {
        commit_batch(&log, stream, &[payload]);
    }

    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

#[test]
fn unsubscribing_suppresses_later_notifications() {
    let log = open_memory_log();
    let stream = StreamId::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let hook = log.on_commit(move |commit| sink.lock().push(commit));

    commit_batch(&log, stream, &["kept"]);
    assert!(log.remove_hook(hook));
    commit_batch(&log, stream, &["silent"]);

    assert_eq!(*seen.lock(), vec![0]);
    assert!(!log.remove_hook(hook));
}

#[test]
fn late_subscriber_sees_only_later_commits() {
    let log = open_memory_log();
    let stream = StreamId::new();
    commit_batch(&log, stream, &["before"]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    log.on_commit(move |commit| sink.lock().push(commit));
    commit_batch(&log, stream, &["after"]);

    assert_eq!(*seen.lock(), vec![1]);
}

#[test]
fn failed_transactions_fire_no_hook() {
    let log = open_memory_log();
    let stream = StreamId::new();
    commit_batch(&log, stream, &["a"]);

    let fired = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&fired);
    log.on_commit(move |_| *counter.lock() += 1);

    let mut txn = log.start_transaction().unwrap();
    txn.store_versioned("stale".to_string(), "evt", stream, 0);
    assert!(txn.commit().wait().is_err());

    assert_eq!(*fired.lock(), 0);
}

#[test]
fn hook_observes_a_fully_committed_log() {
    // The notified commit must already be readable from inside the hook.
    let log = Arc::new(open_memory_log());
    let stream = StreamId::new();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let inner = Arc::clone(&log);
    let sink = Arc::clone(&observed);
    log.on_commit(move |commit| {
        assert!(inner.last_transaction() >= commit);
        let set = inner.commits(commit, commit).next().unwrap().unwrap();
        sink.lock().push((commit, set.len()));
    });

    commit_batch(&log, stream, &["a", "b"]);
    commit_batch(&log, stream, &["c"]);

    assert_eq!(*observed.lock(), vec![(0, 2), (1, 1)]);
}

#[test]
fn hook_may_register_another_hook() {
    let log = Arc::new(open_memory_log());
    let stream = StreamId::new();
    let late = Arc::new(Mutex::new(Vec::new()));

    let registrar = Arc::clone(&log);
    let sink = Arc::clone(&late);
    log.on_commit(move |_| {
        let sink = Arc::clone(&sink);
        registrar.on_commit(move |commit| sink.lock().push(commit));
    });

    commit_batch(&log, stream, &["a"]);
    commit_batch(&log, stream, &["b"]);

    // The hook registered during commit 0 starts observing at commit 1.
    assert_eq!(late.lock().first(), Some(&1));
}
