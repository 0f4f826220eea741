//! Commit hook registry
//!
//! Subscribers observe successful commits by id. Delivery has to satisfy two
//! constraints that pull against each other: ids arrive in commit order, and
//! a slow subscriber must never hold up a committing writer.
//!
//! The registry splits notification in two. `enqueue` runs inside the commit
//! critical section (a queue push under its own small mutex, nothing more),
//! which is what fixes the delivery order. `drain` runs after the section has
//! released: whichever thread wins the drain lock delivers queued ids to the
//! current subscribers, and threads that lose the race simply leave their id
//! behind for the winner. Callbacks therefore run on a committing thread, but
//! never inside the critical section and never under the queue lock.

use factlog_core::types::HookId;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

type HookFn = dyn Fn(i64) + Send + Sync;

/// Ordered, non-blocking delivery of commit ids to subscribers
pub struct HookRegistry {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(HookId, Arc<HookFn>)>>,
    pending: Mutex<VecDeque<i64>>,
    draining: Mutex<()>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            subscribers: RwLock::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            draining: Mutex::new(()),
        }
    }

    /// Add a subscriber; the returned id removes it again
    pub fn register<F>(&self, hook: F) -> HookId
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        let id = HookId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().push((id, Arc::new(hook)));
        id
    }

    /// Remove a subscriber; false if the id was never registered or already
    /// removed
    pub fn remove(&self, id: HookId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(registered, _)| *registered != id);
        subscribers.len() != before
    }

    /// Number of live subscribers
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Queue a commit id for delivery
    ///
    /// Called inside the commit critical section; the queue order is the
    /// delivery order.
    pub fn enqueue(&self, commit: i64) {
        self.pending.lock().push_back(commit);
    }

    /// Deliver queued ids to subscribers
    ///
    /// Called after the critical section has released. If another thread is
    /// already draining, this returns immediately and that thread picks up
    /// the id; a re-entrant call from inside a callback does the same.
    pub fn drain(&self) {
        loop {
            {
                let Some(_guard) = self.draining.try_lock() else {
                    return;
                };
                loop {
                    let Some(commit) = self.pending.lock().pop_front() else {
                        break;
                    };
                    // Snapshot so callbacks may register or remove hooks.
                    let subscribers: Vec<(HookId, Arc<HookFn>)> =
                        self.subscribers.read().clone();
                    trace!(commit, subscribers = subscribers.len(), "delivering commit hook");
                    for (_, hook) in &subscribers {
                        hook(commit);
                    }
                }
            }
            // An id enqueued after the inner loop saw empty but before the
            // drain lock released would otherwise wait for the next commit.
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
