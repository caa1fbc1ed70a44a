//! Optimistic read-modify-write of the manifest
//!
//! One upsert is: validate locally, fetch the manifest with its tag, merge
//! the record in memory, then write conditioned on the tag. A rejected
//! write means another writer committed in between; depending on the
//! [`ConflictRetry`](crate::ConflictRetry) policy the whole cycle runs once
//! more against the new revision.

use crate::config::UpsertConfig;
use crate::error::UpsertError;
use crate::outcome::{Commit, UpsertOutcome};
use toolforge_manifest::{Manifest, MergeEffect, Record, ToolKey};
use toolforge_store::{PutRequest, VersionTag, VersionedStore, WriteCondition};

/// Attempts allowed for one upsert: the first write plus at most one retry
const MAX_ATTEMPTS: u32 = 2;

/// The manifest as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedManifest {
    pub manifest: Manifest,
    /// Tag of the revision read; `None` when the file does not exist
    pub version: Option<VersionTag>,
}

/// Upserts records into the manifest held by `S`
#[derive(Debug)]
pub struct ManifestUpserter<S> {
    store: S,
    config: UpsertConfig,
}

impl<S: VersionedStore> ManifestUpserter<S> {
    /// Create upserter over `store`
    #[inline]
    #[must_use]
    pub fn new(store: S, config: UpsertConfig) -> Self {
        Self { store, config }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &UpsertConfig {
        &self.config
    }

    /// Build the record for an upsert without touching the store
    ///
    /// The key is normalised, the label trimmed, and an empty target
    /// defaults to `tools.<key>`.
    ///
    /// # Errors
    /// - `UpsertError::InvalidKey` if the key is empty once normalised
    /// - `UpsertError::InvalidLabel` if the label is blank
    pub fn prepare(key: &str, label: &str, target: &str) -> Result<Record, UpsertError> {
        let key = ToolKey::normalize(key)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(UpsertError::InvalidLabel);
        }
        let target = match target.trim() {
            "" => key.default_target(),
            given => given.to_string(),
        };
        Ok(Record::new(&key, label, target))
    }

    /// Insert or update the record for `key`
    ///
    /// Validation failures return before any remote call.
    ///
    /// # Errors
    /// See [`UpsertError`]; every failure leaves the remote manifest
    /// untouched.
    pub async fn upsert(
        &self,
        key: &str,
        label: &str,
        target: &str,
    ) -> Result<UpsertOutcome, UpsertError> {
        let record = Self::prepare(key, label, target)?;
        self.upsert_record(record).await
    }

    /// Insert or update a prepared record, extras included
    ///
    /// # Errors
    /// As [`ManifestUpserter::upsert`]. A record whose key is not in
    /// normalised form, or whose label is blank, is rejected up front.
    pub async fn upsert_record(&self, record: Record) -> Result<UpsertOutcome, UpsertError> {
        if !ToolKey::is_normalized(&record.key) {
            return Err(UpsertError::InvalidKey { raw: record.key });
        }
        if record.label.trim().is_empty() {
            return Err(UpsertError::InvalidLabel);
        }
        let key = ToolKey::normalize(&record.key)?;
        let path = self.config.manifest_path.as_str();

        let mut fetched = self.fetch().await?;
        let mut attempt = 1;

        loop {
            let had_version = fetched.version.is_some();
            let mut manifest = fetched.manifest;
            let effect = manifest.upsert(record.clone());
            tracing::debug!(%key, ?effect, attempt, records = manifest.len(), "merged record");

            if !effect.is_change() {
                tracing::info!(%key, path, "record already up to date, skipping write");
                return Ok(UpsertOutcome {
                    key,
                    effect,
                    commit: Commit::Skipped,
                    attempts: attempt,
                });
            }

            let content = manifest.to_yaml().map_err(UpsertError::Encode)?;
            let request = PutRequest::new(
                path,
                content.into_bytes(),
                WriteCondition::from_version(fetched.version.as_ref()),
            )
            .with_message(self.commit_summary(&key, effect));

            match self.store.put_file(request).await {
                Ok(put) => {
                    let commit = Commit::from(put);
                    tracing::info!(
                        %key,
                        path,
                        attempt,
                        version = commit.version().map_or("", VersionTag::short),
                        "committed manifest"
                    );
                    return Ok(UpsertOutcome {
                        key,
                        effect,
                        commit,
                        attempts: attempt,
                    });
                }
                Err(err) if err.is_conflict() => {
                    if attempt >= MAX_ATTEMPTS || !self.config.conflict_retry.allows(had_version) {
                        tracing::warn!(%key, path, attempt, error = %err, "manifest write conflicted");
                        return Err(UpsertError::Conflict {
                            path: path.to_string(),
                            attempts: attempt,
                            source: err,
                        });
                    }
                    tracing::warn!(%key, path, attempt, error = %err, "manifest moved, re-fetching");
                    fetched = self.fetch().await?;
                    attempt += 1;
                }
                Err(err) if err.is_unconfirmed() => {
                    tracing::warn!(%key, path, attempt, error = %err, "manifest write not confirmed");
                    return Err(UpsertError::Unconfirmed {
                        path: path.to_string(),
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(%key, path, attempt, error = %err, "manifest write failed");
                    return Err(UpsertError::Write {
                        path: path.to_string(),
                        source: err,
                    });
                }
            }
        }
    }

    /// Read and decode the manifest
    ///
    /// A missing file is an empty manifest without a tag.
    ///
    /// # Errors
    /// - `UpsertError::Fetch` if the store read fails
    /// - `UpsertError::Decode` if the content is not a valid manifest
    pub async fn fetch(&self) -> Result<FetchedManifest, UpsertError> {
        let path = self.config.manifest_path.as_str();
        let file = self
            .store
            .get_file(path)
            .await
            .map_err(|source| UpsertError::Fetch {
                path: path.to_string(),
                source,
            })?;

        let Some(file) = file else {
            tracing::debug!(path, "manifest not found, starting empty");
            return Ok(FetchedManifest {
                manifest: Manifest::new(),
                version: None,
            });
        };

        let manifest = Manifest::from_bytes(&file.content).map_err(|source| UpsertError::Decode {
            path: path.to_string(),
            source,
        })?;
        tracing::debug!(
            path,
            version = file.version.short(),
            records = manifest.len(),
            "fetched manifest"
        );

        Ok(FetchedManifest {
            manifest,
            version: Some(file.version),
        })
    }

    fn commit_summary(&self, key: &ToolKey, effect: MergeEffect) -> String {
        let verb = match effect {
            MergeEffect::Inserted => "add",
            MergeEffect::Replaced | MergeEffect::Unchanged => "update",
        };
        self.config.commit_message(&format!("{verb} tool {key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolforge_store::MemoryStore;

    #[test]
    fn prepare_normalises_and_defaults_target() {
        type Upserter = ManifestUpserter<MemoryStore>;

        let record = Upserter::prepare("Invoice Gen!", "  Invoice Generator ", "").unwrap();
        assert_eq!(record.key, "invoicegen");
        assert_eq!(record.label, "Invoice Generator");
        assert_eq!(record.target, "tools.invoicegen");

        let record = Upserter::prepare("a", "A", "custom.module").unwrap();
        assert_eq!(record.target, "custom.module");
    }

    #[test]
    fn prepare_rejects_bad_input() {
        type Upserter = ManifestUpserter<MemoryStore>;

        assert_eq!(
            Upserter::prepare("", "Label", "tools.x").unwrap_err(),
            UpsertError::InvalidKey { raw: String::new() }
        );
        assert_eq!(
            Upserter::prepare("!!!", "Label", "tools.x").unwrap_err(),
            UpsertError::InvalidKey { raw: "!!!".into() }
        );
        assert_eq!(
            Upserter::prepare("ok", "   ", "tools.ok").unwrap_err(),
            UpsertError::InvalidLabel
        );
    }

    #[test]
    fn commit_messages_name_the_key() {
        let upserter = ManifestUpserter::new(MemoryStore::new(), UpsertConfig::new());
        assert_eq!(
            upserter.commit_summary(&ToolKey::normalize("notes").unwrap(), MergeEffect::Inserted),
            "toolforge: add tool notes"
        );
    }
}
