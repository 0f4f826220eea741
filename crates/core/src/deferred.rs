//! One-shot deferred results
//!
//! A commit hands back a [`Deferred`] immediately; the value (or error)
//! arrives through the paired [`Completion`]. Both halves are single-use:
//! `resolve` and `fail` consume the completion, `wait` consumes the deferred,
//! so "exactly one outcome, delivered at most once" holds by construction
//! rather than by runtime checks.
//!
//! Dropping a [`Completion`] without completing it wakes any waiter with
//! [`Error::Abandoned`], so a lost producer can never strand a caller past
//! its timeout.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default wait applied by [`Deferred::wait`]
pub const DEFAULT_WAIT: Duration = Duration::from_millis(250);

struct State<T> {
    outcome: Option<Result<T>>,
    abandoned: bool,
}

struct Slot<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

/// Create a connected completion/deferred pair
pub fn deferred<T>() -> (Completion<T>, Deferred<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(State {
            outcome: None,
            abandoned: false,
        }),
        ready: Condvar::new(),
    });
    (
        Completion {
            slot: Some(Arc::clone(&slot)),
        },
        Deferred { slot },
    )
}

/// Producing half of a deferred result
///
/// Held by whoever performs the operation. Must be completed exactly once;
/// the consuming signatures make a second completion unrepresentable.
pub struct Completion<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completion<T> {
    /// Deliver a successful result and wake the waiter
    pub fn resolve(mut self, value: T) {
        self.finish(Ok(value));
    }

    /// Deliver a failure and wake the waiter
    pub fn fail(mut self, error: Error) {
        self.finish(Err(error));
    }

    fn finish(&mut self, outcome: Result<T>) {
        if let Some(slot) = self.slot.take() {
            let mut state = slot.state.lock();
            state.outcome = Some(outcome);
            slot.ready.notify_all();
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            let mut state = slot.state.lock();
            if state.outcome.is_none() {
                state.abandoned = true;
                slot.ready.notify_all();
            }
        }
    }
}

/// Consuming half of a deferred result
///
/// Waiting blocks the calling thread; a timeout abandons the wait, never the
/// operation behind it.
pub struct Deferred<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Deferred<T> {
    /// Wait up to [`DEFAULT_WAIT`] for the result
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] if nothing arrived in time, [`Error::Abandoned`] if
    /// the completion was dropped, or the failure the producer delivered.
    pub fn wait(self) -> Result<T> {
        self.wait_timeout(DEFAULT_WAIT)
    }

    /// Wait up to `timeout` for the result
    ///
    /// # Errors
    ///
    /// Same as [`Deferred::wait`].
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        loop {
            if let Some(outcome) = state.outcome.take() {
                return outcome;
            }
            if state.abandoned {
                return Err(Error::Abandoned);
            }
            if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                // The completion may have landed while the wait timed out.
                if let Some(outcome) = state.outcome.take() {
                    return outcome;
                }
                if state.abandoned {
                    return Err(Error::Abandoned);
                }
                return Err(Error::Timeout);
            }
        }
    }

    /// Check whether an outcome is already available
    ///
    /// True once resolved, failed, or abandoned; a subsequent wait will not
    /// block.
    pub fn is_complete(&self) -> bool {
        let state = self.slot.state.lock();
        state.outcome.is_some() || state.abandoned
    }
}
