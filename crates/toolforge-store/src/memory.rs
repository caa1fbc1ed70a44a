//! In-process versioned store
//!
//! Holds files in a `parking_lot` mutex; the precondition check and the
//! write happen under one lock, which gives the same all-or-nothing
//! behaviour a remote store provides. Used by tests and dry runs.

use crate::error::StoreError;
use crate::store::{PutOutcome, PutRequest, StoredFile, VersionedStore, WriteCondition};
use crate::version::VersionTag;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// `get_file` calls
    pub reads: usize,
    /// Successful `put_file` calls
    pub writes: usize,
    /// `put_file` calls rejected by their precondition
    pub conflicts: usize,
}

impl StoreStats {
    /// Total remote calls of any kind
    #[inline]
    #[must_use]
    pub fn calls(&self) -> usize {
        self.reads + self.writes + self.conflicts
    }
}

#[derive(Debug, Default)]
struct State {
    files: HashMap<String, StoredFile>,
    generation: u64,
}

impl State {
    fn store(&mut self, path: &str, content: Vec<u8>) -> VersionTag {
        self.generation += 1;
        let version = VersionTag::mint(self.generation, &content);
        self.files.insert(
            path.to_string(),
            StoredFile {
                content,
                version: version.clone(),
            },
        );
        version
    }
}

/// Versioned store backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    conflicts: AtomicUsize,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a pre-existing file
    #[must_use]
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.state.lock().store(path, content.into());
        self
    }

    /// Write unconditionally, bypassing counters
    ///
    /// Stands in for a writer outside the code under test.
    pub fn force_put(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionTag {
        self.state.lock().store(path, content.into())
    }

    /// Delete a file, returning whether it existed
    pub fn remove(&self, path: &str) -> bool {
        self.state.lock().files.remove(path).is_some()
    }

    /// Current content of a file
    #[must_use]
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).map(|f| f.content.clone())
    }

    /// Current content of a file as UTF-8 text
    #[must_use]
    pub fn text(&self, path: &str) -> Option<String> {
        self.content(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Current tag of a file
    #[must_use]
    pub fn version(&self, path: &str) -> Option<VersionTag> {
        self.state.lock().files.get(path).map(|f| f.version.clone())
    }

    /// Snapshot of the operation counters
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl VersionedStore for MemoryStore {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.state.lock().files.get(path).cloned())
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        let mut state = self.state.lock();
        let current = state.files.get(&request.path).map(|f| f.version.clone());

        let rejection = match (&request.condition, &current) {
            (WriteCondition::CreateOnly, Some(found)) => {
                Some(format!("file already exists at version {}", found.short()))
            }
            (WriteCondition::IfMatch(expected), None) => {
                Some(format!("expected version {} but file is gone", expected.short()))
            }
            (WriteCondition::IfMatch(expected), Some(found)) if expected != found => Some(format!(
                "expected version {} but found {}",
                expected.short(),
                found.short()
            )),
            _ => None,
        };

        if let Some(detail) = rejection {
            drop(state);
            self.conflicts.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %request.path, %detail, "memory store rejected write");
            return Err(StoreError::conflict(request.path, detail));
        }

        let version = state.store(&request.path, request.content);
        drop(state);
        self.writes.fetch_add(1, Ordering::Relaxed);

        Ok(if current.is_some() {
            PutOutcome::Updated(version)
        } else {
            PutOutcome::Created(version)
        })
    }
}
