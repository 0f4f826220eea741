//! Property Tests
//!
//! Model-based checks of the commit protocol: after any sequence of default
//! and pinned-version submissions, the log's committed state must match a
//! simple sequential model of version assignment.

use crate::common::{commit_batch, open_memory_log, versions_by_stream};
use factlog_core::error::Error;
use factlog_core::types::StreamId;
use proptest::collection::vec;
use proptest::prelude::*;
use rustc_hash::FxHashMap;

const STREAMS: usize = 4;

#[derive(Debug, Clone)]
enum Step {
    /// One transaction storing `count` version-assigned events on a stream.
    Defaults { stream: usize, count: usize },
    /// One transaction pinning a single event to `expected + offset`.
    Pinned { stream: usize, offset: i64 },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..STREAMS, 1..4usize).prop_map(|(stream, count)| Step::Defaults { stream, count }),
        (0..STREAMS, -2..3i64).prop_map(|(stream, offset)| Step::Pinned { stream, offset }),
    ]
}

proptest! {
    #[test]
    fn prop_log_matches_sequential_model(steps in vec(arb_step(), 1..40)) {
        let log = open_memory_log();
        let streams: Vec<StreamId> = (0..STREAMS).map(|_| StreamId::new()).collect();

        // Versions each stream should hold afterwards, in commit order. The
        // next expected version is always one past the last held entry.
        let mut model: FxHashMap<StreamId, Vec<i64>> = FxHashMap::default();
        let mut commits = 0i64;

        for step in &steps {
            match *step {
                Step::Defaults { stream, count } => {
                    let stream = streams[stream];
                    let mut txn = log.start_transaction().unwrap();
                    for i in 0..count {
                        txn.store(format!("d{i}"), "evt", stream);
                    }
                    let commit = txn.commit().wait().unwrap();
                    prop_assert_eq!(commit, commits);
                    commits += 1;

                    let held = model.entry(stream).or_default();
                    let next = held.last().map_or(0, |v| v + 1);
                    held.extend(next..next + count as i64);
                }
                Step::Pinned { stream, offset } => {
                    let stream = streams[stream];
                    let expected = model
                        .get(&stream)
                        .and_then(|held| held.last())
                        .map_or(0, |v| v + 1);
                    let pinned = expected + offset;

                    let mut txn = log.start_transaction().unwrap();
                    txn.store_versioned(format!("p{pinned}"), "evt", stream, pinned);
                    let outcome = txn.commit().wait();

                    if offset < 0 {
                        // Stale pins fail the whole transaction and occupy
                        // no commit id.
                        prop_assert!(
                            matches!(outcome, Err(Error::VersionConflict { .. })),
                            "assertion failed: matches!(outcome, Err(Error::VersionConflict {{ .. }}))"
                        );
                        prop_assert_eq!(log.last_transaction(), commits - 1);
                    } else {
                        prop_assert_eq!(outcome.unwrap(), commits);
                        commits += 1;
                        model.entry(stream).or_default().push(pinned);
                    }
                }
            }
        }

        prop_assert_eq!(log.last_transaction(), commits - 1);
        prop_assert_eq!(versions_by_stream(&log), model);
    }

    #[test]
    fn prop_stale_pin_poisons_the_whole_batch(
        fill in vec(0..STREAMS, 0..6),
        victim in 0..STREAMS,
    ) {
        let log = open_memory_log();
        let streams: Vec<StreamId> = (0..STREAMS).map(|_| StreamId::new()).collect();
        for &stream in &streams {
            commit_batch(&log, stream, &["seed"]);
        }
        let seeded = versions_by_stream(&log);

        // Version 0 is taken on every stream, so this pin can never apply,
        // and the filler events must not apply either.
        let mut txn = log.start_transaction().unwrap();
        for &stream in &fill {
            txn.store("fill".to_string(), "evt", streams[stream]);
        }
        txn.store_versioned("stale".to_string(), "evt", streams[victim], 0);
        let err = txn.commit().wait().unwrap_err();

        prop_assert!(
            matches!(err, Error::VersionConflict { supplied: 0, .. }),
            "assertion failed: matches!(err, Error::VersionConflict {{ supplied: 0, .. }})"
        );
        prop_assert_eq!(log.last_transaction(), STREAMS as i64 - 1);
        prop_assert_eq!(versions_by_stream(&log), seeded);
    }
}
