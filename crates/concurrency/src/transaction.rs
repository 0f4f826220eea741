//! Transaction building and the commit/retry protocol
//!
//! A transaction buffers submissions locally, then drives the engine through
//! [`CommitTarget`]: capture the commit token, resolve stream versions
//! against committed state, hand the batch to the engine's atomic commit
//! step, and retry from scratch when the token lost its race.
//!
//! ## Protocol Invariant
//!
//! The token is captured BEFORE versions are resolved. Committed state only
//! changes together with the token, so versions resolved after a capture are
//! either consistent with that token or the attempt fails its token check and
//! resolution runs again. Resolving first would allow a stale version to ride
//! in on a fresh token.
//!
//! Token conflicts are ordinary outcomes here, not errors; only a version
//! conflict (permanent), an exhausted retry budget, or a storage failure
//! reaches the caller.

use factlog_core::deferred::{deferred, Deferred};
use factlog_core::error::{Error, Result};
use factlog_core::event::{EventEnvelope, EventHeader};
use factlog_core::types::{StreamId, TransactionId};
use rustc_hash::FxHashMap;
use std::time::Duration;
use tracing::{trace, warn};

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for commit retry behavior
///
/// A conflicting attempt is retried against fresh state up to `max_attempts`
/// times in total. The default retries immediately; contended deployments can
/// add exponential backoff.
///
/// # Example
/// ```ignore
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_base_delay_ms(10)
///     .with_max_delay_ms(200);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total commit attempts, first try included (minimum 1)
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }
}

impl RetryPolicy {
    /// Create a RetryPolicy with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryPolicy that gives up after the first conflict
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set total number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between attempts
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

// ============================================================================
// Commit Target
// ============================================================================

/// Outcome of one atomic commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The batch was applied and assigned this commit id
    Committed(i64),
    /// The token lost its race; the batch was left untouched
    Conflict,
}

/// The engine surface a transaction commits through
///
/// Object safe so the protocol can be exercised against scripted targets in
/// tests. Implemented by both log engine variants.
pub trait CommitTarget<E> {
    /// Current commit token (the published commit sequence value)
    fn commit_token(&self) -> i64;

    /// Version the committed state would assign next on `stream`
    fn next_expected_version(&self, stream: StreamId) -> i64;

    /// Atomically apply `batch` if `token` still matches committed state
    ///
    /// On [`CommitOutcome::Committed`] the batch has been drained into
    /// storage. On [`CommitOutcome::Conflict`] the batch is untouched and the
    /// caller may resolve and try again.
    ///
    /// # Errors
    ///
    /// A non-conflict failure applying the batch, wrapped as
    /// [`Error::CommitFailed`]. Such failures are permanent.
    fn attempt_commit(&self, token: i64, batch: &mut Vec<EventEnvelope<E>>)
        -> Result<CommitOutcome>;
}

// ============================================================================
// Transaction
// ============================================================================

/// An in-flight transaction: buffered submissions plus the commit protocol
///
/// Obtained from an engine's `start_transaction`. Submissions cost nothing
/// until [`Transaction::commit`], which consumes the transaction; abandoning
/// it instead is free and leaves no trace in the log.
pub struct Transaction<'a, E> {
    id: TransactionId,
    target: &'a dyn CommitTarget<E>,
    batch: Vec<EventEnvelope<E>>,
    // Parallel to `batch`: Some for caller-pinned versions, None for assigned.
    explicit: Vec<Option<i64>>,
    policy: RetryPolicy,
}

impl<'a, E> Transaction<'a, E> {
    /// Bind a fresh transaction to a commit target
    pub fn new(target: &'a dyn CommitTarget<E>, policy: RetryPolicy) -> Self {
        Self {
            id: TransactionId::new(),
            target,
            batch: Vec::new(),
            explicit: Vec::new(),
            policy,
        }
    }

    /// This transaction's identity, carried by every envelope it commits
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Number of buffered submissions
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Whether nothing has been submitted yet
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Buffer an event; its stream version is assigned at commit time
    pub fn store(&mut self, payload: E, discriminator: impl Into<String>, stream: StreamId) {
        self.push(payload, discriminator.into(), stream, None);
    }

    /// Buffer an event pinned to an explicit stream version
    ///
    /// The commit fails with [`Error::VersionConflict`] if the stream has
    /// meanwhile advanced past `version`. Versions above the next expected
    /// one are accepted as given.
    pub fn store_versioned(
        &mut self,
        payload: E,
        discriminator: impl Into<String>,
        stream: StreamId,
        version: i64,
    ) {
        self.push(payload, discriminator.into(), stream, Some(version));
    }

    fn push(&mut self, payload: E, discriminator: String, stream: StreamId, version: Option<i64>) {
        // The version slot is finalized by resolve_versions on each attempt.
        let header = EventHeader::new(self.id, discriminator, stream, version.unwrap_or(-1));
        self.batch.push(EventEnvelope::new(header, payload));
        self.explicit.push(version);
    }

    /// Commit the buffered batch
    ///
    /// Runs the token/resolve/apply cycle, retrying conflicting attempts up
    /// to the policy's budget, and completes the returned deferred with the
    /// assigned commit id or with the first permanent error. An empty batch
    /// still commits and occupies a commit id.
    pub fn commit(mut self) -> Deferred<i64> {
        let (completion, result) = deferred();
        match self.run() {
            Ok(commit) => completion.resolve(commit),
            Err(e) => completion.fail(e),
        }
        result
    }

    fn run(&mut self) -> Result<i64> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 0..attempts {
            let token = self.target.commit_token();
            self.resolve_versions()?;
            match self.target.attempt_commit(token, &mut self.batch)? {
                CommitOutcome::Committed(commit) => {
                    trace!(transaction = %self.id, commit, attempt, "transaction committed");
                    return Ok(commit);
                }
                CommitOutcome::Conflict => {
                    trace!(transaction = %self.id, token, attempt, "commit token lost its race");
                    if attempt + 1 < attempts {
                        let delay = self.policy.delay_for(attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }
        warn!(transaction = %self.id, attempts, "commit abandoned, retry budget exhausted");
        Err(Error::CommitExhausted { attempts })
    }

    /// Assign a version to every buffered envelope against live state
    ///
    /// Assignments made earlier in the same attempt chain within the batch;
    /// the working map starts empty on every attempt so a failed attempt
    /// leaves nothing behind.
    fn resolve_versions(&mut self) -> Result<()> {
        let mut assigned: FxHashMap<StreamId, i64> = FxHashMap::default();
        for (envelope, explicit) in self.batch.iter_mut().zip(&self.explicit) {
            let stream = envelope.header.stream;
            let next = match assigned.get(&stream) {
                Some(version) => version + 1,
                None => self.target.next_expected_version(stream),
            };
            let version = match *explicit {
                Some(supplied) if supplied < next => {
                    return Err(Error::VersionConflict {
                        stream,
                        supplied,
                        expected: next,
                    });
                }
                Some(supplied) => supplied,
                None => next,
            };
            envelope.header.stream_version = version;
            assigned.insert(stream, version);
        }
        Ok(())
    }
}
