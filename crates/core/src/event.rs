//! Event record model
//!
//! ## Design Principles
//!
//! 1. **Append-Only**: Envelopes and sets are immutable once constructed.
//!    There are no update or delete operations anywhere in the model.
//!
//! 2. **Opaque Payloads**: The log never inspects `E`. Discrimination is the
//!    caller's job via the `discriminator` tag on each header.
//!
//! 3. **Batch Atomicity**: An [`EventSet`] is the unit of commit. Either the
//!    whole set is assigned a commit id and stored, or none of it is.

use crate::types::{StreamId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Metadata carried by every stored event
///
/// Headers are written once at commit time and never change. The timestamp is
/// captured when the event was submitted to its transaction, not when the
/// transaction committed, so intra-batch ordering survives retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Transaction that committed this event
    pub transaction: TransactionId,
    /// Submission time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied type tag for the payload
    pub discriminator: String,
    /// Stream this event belongs to
    pub stream: StreamId,
    /// Position within the stream, zero-based and gap-free
    pub stream_version: i64,
}

impl EventHeader {
    /// Create a header stamped with the current time
    pub fn new(
        transaction: TransactionId,
        discriminator: impl Into<String>,
        stream: StreamId,
        stream_version: i64,
    ) -> Self {
        Self {
            transaction,
            timestamp: Utc::now(),
            discriminator: discriminator.into(),
            stream,
            stream_version,
        }
    }
}

/// One stored event: header plus caller payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    /// Event metadata
    pub header: EventHeader,
    /// Caller payload, opaque to the log
    pub payload: E,
}

impl<E> EventEnvelope<E> {
    /// Pair a header with its payload
    pub fn new(header: EventHeader, payload: E) -> Self {
        Self { header, payload }
    }

    /// Stream this envelope belongs to
    pub fn stream(&self) -> StreamId {
        self.header.stream
    }

    /// Position within the stream
    pub fn stream_version(&self) -> i64 {
        self.header.stream_version
    }
}

/// An immutable batch of envelopes sharing one commit
///
/// Constructed exactly once when a commit succeeds; the commit id is fixed at
/// construction. Readers receive sets behind `Arc`, so a set is never copied
/// or mutated after it reaches storage.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventSet<E> {
    commit: i64,
    envelopes: Vec<EventEnvelope<E>>,
}

impl<E> EventSet<E> {
    /// Bind a batch of envelopes to its commit id
    pub fn new(commit: i64, envelopes: Vec<EventEnvelope<E>>) -> Self {
        Self { commit, envelopes }
    }

    /// Commit id assigned to this set
    pub fn commit(&self) -> i64 {
        self.commit
    }

    /// The envelopes in submission order
    pub fn envelopes(&self) -> &[EventEnvelope<E>] {
        &self.envelopes
    }

    /// Number of envelopes in the set
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Whether the set holds no envelopes
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Iterate over the envelopes in submission order
    pub fn iter(&self) -> std::slice::Iter<'_, EventEnvelope<E>> {
        self.envelopes.iter()
    }

    /// Take the envelopes out, discarding the commit binding
    ///
    /// Used when sets move between logs (preloading); the receiving log
    /// assigns its own commit ids.
    pub fn into_envelopes(self) -> Vec<EventEnvelope<E>> {
        self.envelopes
    }

    /// Highest stream version per stream touched by this set
    ///
    /// Order follows first appearance in the batch. Most batches touch one or
    /// two streams, so the summary stays on the stack.
    pub fn stream_versions(&self) -> SmallVec<[(StreamId, i64); 4]> {
        let mut summary: SmallVec<[(StreamId, i64); 4]> = SmallVec::new();
        for envelope in &self.envelopes {
            match summary.iter_mut().find(|(s, _)| *s == envelope.stream()) {
                Some((_, version)) => {
                    if envelope.stream_version() > *version {
                        *version = envelope.stream_version();
                    }
                }
                None => summary.push((envelope.stream(), envelope.stream_version())),
            }
        }
        summary
    }
}

impl<'a, E> IntoIterator for &'a EventSet<E> {
    type Item = &'a EventEnvelope<E>;
    type IntoIter = std::slice::Iter<'a, EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.iter()
    }
}
