//! Incremental index of committed stream versions
//!
//! Version resolution asks "what version comes next on this stream" on every
//! commit attempt, so the answer has to be a map lookup, never a scan over
//! stored sets. The index is folded forward inside the commit critical
//! section and rebuilt wholesale only when a backend is (re)attached.

use factlog_core::error::Result;
use factlog_core::event::EventSet;
use factlog_core::traits::EventStorage;
use factlog_core::types::StreamId;
use rustc_hash::FxHashMap;

/// Highest committed version per stream
///
/// An absent stream has no committed events; its next version is 0.
#[derive(Debug, Default)]
pub struct StreamVersionIndex {
    versions: FxHashMap<StreamId, i64>,
}

impl StreamVersionIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from everything a backend holds
    ///
    /// Pure function over the storage port: reads `all()` once and folds it.
    /// Used at engine construction and on storage switches; callers guarantee
    /// no commit is in flight against `storage` while it runs.
    ///
    /// # Errors
    ///
    /// Propagates the backend's enumeration error.
    pub fn rebuild<E>(storage: &dyn EventStorage<E>) -> Result<Self> {
        let mut index = Self::new();
        for set in storage.all()? {
            index.fold_set(&set);
        }
        Ok(index)
    }

    /// Version the stream would assign to its next event
    pub fn next_expected(&self, stream: StreamId) -> i64 {
        self.versions.get(&stream).map_or(0, |last| last + 1)
    }

    /// Highest committed version on the stream, if any
    pub fn last_version(&self, stream: StreamId) -> Option<i64> {
        self.versions.get(&stream).copied()
    }

    /// Record a committed version, keeping the per-stream maximum
    pub fn observe(&mut self, stream: StreamId, version: i64) {
        let entry = self.versions.entry(stream).or_insert(version);
        if version > *entry {
            *entry = version;
        }
    }

    /// Fold one committed set into the index
    pub fn fold_set<E>(&mut self, set: &EventSet<E>) {
        for (stream, version) in set.stream_versions() {
            self.observe(stream, version);
        }
    }

    /// Number of streams with at least one committed event
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether no stream has committed events
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
