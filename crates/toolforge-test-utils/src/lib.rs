//! Testing utilities for toolforge workspace
//!
//! Store wrappers that inject faults, force interleavings and record
//! traffic, plus manifest fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;
use toolforge_manifest::{Manifest, Record, ToolKey};
use toolforge_store::{
    MemoryStore, PutOutcome, PutRequest, StoreError, StoredFile, VersionedStore, WriteCondition,
};

/// Default manifest path used across tests
pub const MANIFEST_PATH: &str = "tools.yaml";

/// Build a record from a raw key
///
/// # Panics
/// If `key` does not normalise.
pub fn record(key: &str, label: &str, target: &str) -> Record {
    let key = ToolKey::normalize(key).expect("fixture key must normalise");
    Record::new(&key, label, target)
}

/// Canonical manifest text for `(key, label, target)` triples
///
/// # Panics
/// If the triples contain duplicate keys.
pub fn manifest_yaml(entries: &[(&str, &str, &str)]) -> String {
    let records = entries
        .iter()
        .map(|(key, label, target)| record(key, label, target))
        .collect();
    Manifest::from_records(records)
        .expect("fixture keys must be unique")
        .to_yaml()
        .expect("fixture manifest must encode")
}

/// Memory store seeded with a manifest at [`MANIFEST_PATH`]
pub fn seeded_store(entries: &[(&str, &str, &str)]) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_file(MANIFEST_PATH, manifest_yaml(entries)))
}

/// Decode the manifest currently held by `store`
///
/// # Panics
/// If the file is missing or does not decode.
pub fn stored_manifest(store: &MemoryStore) -> Manifest {
    let text = store.text(MANIFEST_PATH).expect("manifest should exist");
    Manifest::parse(&text).expect("stored manifest should decode")
}

/// Store that fails scripted calls before delegating
///
/// Queued errors are consumed one per call, in order.
pub struct FaultyStore<S> {
    inner: S,
    get_faults: Mutex<VecDeque<StoreError>>,
    put_faults: Mutex<VecDeque<StoreError>>,
}

impl<S: VersionedStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            get_faults: Mutex::new(VecDeque::new()),
            put_faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Fail the next `get_file` with `error`
    #[must_use]
    pub fn fail_get(self, error: StoreError) -> Self {
        self.get_faults.lock().push_back(error);
        self
    }

    /// Fail the next `put_file` with `error`
    #[must_use]
    pub fn fail_put(self, error: StoreError) -> Self {
        self.put_faults.lock().push_back(error);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: VersionedStore> VersionedStore for FaultyStore<S> {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let fault = self.get_faults.lock().pop_front();
        match fault {
            Some(error) => Err(error),
            None => self.inner.get_file(path).await,
        }
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        let fault = self.put_faults.lock().pop_front();
        match fault {
            Some(error) => Err(error),
            None => self.inner.put_file(request).await,
        }
    }
}

/// Store whose first `parties` reads wait for each other
///
/// Guarantees that concurrent upserts all observe the same revision before
/// any of them writes.
pub struct GatedStore<S> {
    inner: S,
    barrier: Barrier,
    parties: usize,
    gated: AtomicUsize,
}

impl<S: VersionedStore> GatedStore<S> {
    pub fn new(inner: S, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            gated: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<S: VersionedStore> VersionedStore for GatedStore<S> {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let result = self.inner.get_file(path).await;
        if self.gated.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        result
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        self.inner.put_file(request).await
    }
}

/// Memory store with another writer that commits just before our writes
///
/// Each queued interloping write lands immediately before the next
/// `put_file`, which therefore sees a moved version.
pub struct InterloperStore {
    inner: Arc<MemoryStore>,
    pending: Mutex<VecDeque<(String, Vec<u8>)>>,
}

impl InterloperStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a foreign write to `path`
    #[must_use]
    pub fn interlope(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.pending.lock().push_back((path.to_string(), content.into()));
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl VersionedStore for InterloperStore {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        self.inner.get_file(path).await
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        let foreign = self.pending.lock().pop_front();
        if let Some((path, content)) = foreign {
            self.inner.force_put(&path, content);
        }
        self.inner.put_file(request).await
    }
}

/// One observed store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Put {
        path: String,
        condition: WriteCondition,
        message: String,
    },
}

/// Store that logs every call before delegating
pub struct RecordingStore<S> {
    inner: S,
    calls: Mutex<Vec<Call>>,
}

impl<S: VersionedStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls seen so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Conditions of the writes seen so far
    pub fn write_conditions(&self) -> Vec<WriteCondition> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Put { condition, .. } => Some(condition.clone()),
                Call::Get(_) => None,
            })
            .collect()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: VersionedStore> VersionedStore for RecordingStore<S> {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        self.calls.lock().push(Call::Get(path.to_string()));
        self.inner.get_file(path).await
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        self.calls.lock().push(Call::Put {
            path: request.path.clone(),
            condition: request.condition.clone(),
            message: request.message.clone(),
        });
        self.inner.put_file(request).await
    }
}
