//! The manifest value and its in-memory merge
//!
//! A [`Manifest`] is fetched, mutated in local memory, and committed or
//! discarded. It never outlives a single upsert.

use crate::error::ManifestError;
use crate::record::Record;
use serde_yaml::Mapping;
use std::collections::HashMap;

/// What [`Manifest::upsert`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeEffect {
    /// Key was absent; record appended at the end
    Inserted,
    /// Key was present; label/target overwritten in place
    Replaced,
    /// Key was present with identical values; nothing changed
    Unchanged,
}

impl MergeEffect {
    /// Whether the manifest content changed
    #[inline]
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Ordered tool records with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// Records in file order
    records: Vec<Record>,
    /// Top-level document keys other than `tools`, in file order
    extra: Mapping,
}

impl Manifest {
    /// Create empty manifest
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from records, enforcing key uniqueness
    ///
    /// # Errors
    /// Returns [`ManifestError::DuplicateKey`] with 1-based entry indices.
    pub fn from_records(records: Vec<Record>) -> Result<Self, ManifestError> {
        Self::from_parts(records, Mapping::new())
    }

    pub(crate) fn from_parts(records: Vec<Record>, extra: Mapping) -> Result<Self, ManifestError> {
        check_unique(&records)?;
        Ok(Self { records, extra })
    }

    /// Records in order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Other top-level document keys
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &Mapping {
        &self.extra
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the record with `key`
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }

    /// Record with `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    /// Insert or update `record` by key
    ///
    /// An existing record is mutated in place so its position, and the
    /// relative order of every other record, is preserved. A new key is
    /// appended.
    pub fn upsert(&mut self, record: Record) -> MergeEffect {
        match self.records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) if existing.covers(&record) => MergeEffect::Unchanged,
            Some(existing) => {
                existing.absorb(record);
                MergeEffect::Replaced
            }
            None => {
                self.records.push(record);
                MergeEffect::Inserted
            }
        }
    }

    /// Consume into records
    #[inline]
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

fn check_unique(records: &[Record]) -> Result<(), ManifestError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        if let Some(first) = seen.insert(record.key.as_str(), idx + 1) {
            return Err(ManifestError::DuplicateKey {
                key: record.key.clone(),
                first,
                second: idx + 1,
            });
        }
    }
    Ok(())
}
