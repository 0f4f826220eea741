//! Mutual exclusion strategies for the commit critical section
//!
//! The commit protocol has exactly one blocking region. How that region is
//! guarded is the only difference between the thread-safe log and the
//! thread-confined one, so the guard is a strategy type and the protocol is
//! written once against it.
//!
//! - [`MutexExclusion`]: a real lock; callers from any thread are welcome.
//! - [`ThreadConfined`]: no lock at all; the first thread to pass the caller
//!   check owns the value for its lifetime, and every other thread is turned
//!   away before it can touch shared state.

use factlog_core::error::{Error, Result};
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::thread::{self, ThreadId};

/// Strategy guarding exclusive access to the commit-protocol state
///
/// `check_caller` is the admission gate, run before any transaction work;
/// `exclusive` is the critical-section entry. Implementations are sealed:
/// the protocol is only sound for the two disciplines below.
pub trait Exclusion<S>: private::Sealed {
    /// Wrap the protocol state in this strategy's guard
    fn new(state: S) -> Self
    where
        Self: Sized;

    /// Admit or reject the calling thread
    ///
    /// # Errors
    ///
    /// [`Error::WrongThread`] when a confined strategy is entered from a
    /// thread other than its owner.
    fn check_caller(&self) -> Result<()>;

    /// Run `f` with exclusive access to the state
    fn exclusive<R, F: FnOnce(&mut S) -> R>(&self, f: F) -> R;
}

/// Lock-based exclusion for logs shared across threads
pub struct MutexExclusion<S> {
    state: Mutex<S>,
}

impl<S> Exclusion<S> for MutexExclusion<S> {
    fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn check_caller(&self) -> Result<()> {
        Ok(())
    }

    fn exclusive<R, F: FnOnce(&mut S) -> R>(&self, f: F) -> R {
        let mut guard = self.state.lock();
        f(&mut guard)
    }
}

/// Lock-free exclusion for logs owned by a single thread
///
/// Binds to the first thread that passes [`Exclusion::check_caller`]; later
/// calls from any other thread fail fast. The type stays `Send` so a log can
/// be built on one thread and handed to its working thread before first use,
/// but it is deliberately not `Sync`.
pub struct ThreadConfined<S> {
    state: RefCell<S>,
    owner: Cell<Option<ThreadId>>,
}

impl<S> Exclusion<S> for ThreadConfined<S> {
    fn new(state: S) -> Self {
        Self {
            state: RefCell::new(state),
            owner: Cell::new(None),
        }
    }

    fn check_caller(&self) -> Result<()> {
        let current = thread::current().id();
        match self.owner.get() {
            None => {
                self.owner.set(Some(current));
                Ok(())
            }
            Some(bound) if bound == current => Ok(()),
            Some(bound) => Err(Error::WrongThread { bound, current }),
        }
    }

    fn exclusive<R, F: FnOnce(&mut S) -> R>(&self, f: F) -> R {
        f(&mut self.state.borrow_mut())
    }
}

mod private {
    pub trait Sealed {}
    impl<S> Sealed for super::MutexExclusion<S> {}
    impl<S> Sealed for super::ThreadConfined<S> {}
}
