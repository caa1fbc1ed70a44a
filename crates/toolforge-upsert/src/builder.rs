//! Tool builder: generate a tool module and register it
//!
//! The module file is committed first and the manifest second, so the
//! manifest never points at a module that was not written.

use crate::error::UpsertError;
use crate::outcome::{Commit, UpsertOutcome};
use crate::upserter::ManifestUpserter;
use toolforge_manifest::{Record, Tier, ToolKey, SECTION_FIELD, TIER_FIELD};
use toolforge_scaffold::{Preset, Scaffold};
use toolforge_store::{PutRequest, VersionedStore, WriteCondition};

/// What to build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRequest {
    pub key: String,
    pub label: String,
    pub description: String,
    /// Force a preset instead of detecting one
    pub preset: Option<Preset>,
    pub tier: Option<Tier>,
    pub section: Option<String>,
}

impl ToolRequest {
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    #[must_use]
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// Result of a build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub key: ToolKey,
    pub scaffold: Scaffold,
    /// Repository path of the module
    pub module_path: String,
    /// Module commit; `None` on a dry run
    pub module_commit: Option<Commit>,
    /// Manifest upsert; `None` on a dry run
    pub manifest: Option<UpsertOutcome>,
}

impl BuildOutcome {
    #[inline]
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.module_commit.is_none()
    }

    /// Human-readable summary
    #[must_use]
    pub fn message(&self) -> String {
        let module = match &self.module_commit {
            None => format!("Would write {} ({} preset).", self.module_path, self.scaffold.preset),
            Some(Commit::Created(_)) => format!("Wrote {}.", self.module_path),
            Some(Commit::Updated(_)) => format!("Rewrote {}.", self.module_path),
            Some(Commit::Skipped) => format!("{} is unchanged.", self.module_path),
        };
        match &self.manifest {
            Some(outcome) => format!("{module} {}", outcome.message()),
            None => module,
        }
    }
}

/// Generates tool modules and registers them in the manifest
#[derive(Debug)]
pub struct ToolBuilder<S> {
    upserter: ManifestUpserter<S>,
    dry_run: bool,
}

impl<S: VersionedStore> ToolBuilder<S> {
    #[inline]
    #[must_use]
    pub fn new(upserter: ManifestUpserter<S>) -> Self {
        Self {
            upserter,
            dry_run: false,
        }
    }

    /// Render only; make no remote calls
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[inline]
    #[must_use]
    pub fn upserter(&self) -> &ManifestUpserter<S> {
        &self.upserter
    }

    /// Generate, write and register a tool
    ///
    /// # Errors
    /// - validation errors before any remote call
    /// - `UpsertError::Fetch`/`Conflict`/`Write` for the module file,
    ///   in which case the manifest is not touched
    /// - any manifest upsert error
    pub async fn build(&self, request: &ToolRequest) -> Result<BuildOutcome, UpsertError> {
        let record = Self::record_for(request)?;
        let key = ToolKey::normalize(&record.key)?;

        let scaffold = match request.preset {
            Some(preset) => {
                toolforge_scaffold::render_preset(preset, &key, &record.label, &request.description)?
            }
            None => toolforge_scaffold::render(&key, &record.label, &request.description)?,
        };
        let module_path = scaffold.path_in(&self.upserter.config().tools_dir);

        if self.dry_run {
            tracing::info!(%key, path = %module_path, preset = %scaffold.preset, "dry run, nothing written");
            return Ok(BuildOutcome {
                key,
                scaffold,
                module_path,
                module_commit: None,
                manifest: None,
            });
        }

        let module_commit = self.write_module(&key, &module_path, &scaffold).await?;
        let manifest = self.upserter.upsert_record(record).await?;

        Ok(BuildOutcome {
            key,
            scaffold,
            module_path,
            module_commit: Some(module_commit),
            manifest: Some(manifest),
        })
    }

    fn record_for(request: &ToolRequest) -> Result<Record, UpsertError> {
        let mut record = ManifestUpserter::<S>::prepare(&request.key, &request.label, "")?;
        if let Some(tier) = request.tier {
            record = record.with_extra(TIER_FIELD, tier.as_str());
        }
        if let Some(section) = request.section.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            record = record.with_extra(SECTION_FIELD, section);
        }
        Ok(record)
    }

    async fn write_module(
        &self,
        key: &ToolKey,
        path: &str,
        scaffold: &Scaffold,
    ) -> Result<Commit, UpsertError> {
        let store = self.upserter.store();
        let existing = store
            .get_file(path)
            .await
            .map_err(|source| UpsertError::Fetch {
                path: path.to_string(),
                source,
            })?;

        if existing
            .as_ref()
            .is_some_and(|file| file.content == scaffold.source.as_bytes())
        {
            tracing::debug!(%key, path, "tool module unchanged");
            return Ok(Commit::Skipped);
        }

        let condition = WriteCondition::from_version(existing.as_ref().map(|file| &file.version));
        let verb = if existing.is_some() { "update" } else { "add" };
        let request = PutRequest::new(path, scaffold.source.clone().into_bytes(), condition)
            .with_message(
                self.upserter
                    .config()
                    .commit_message(&format!("{verb} tool module {key}")),
            );

        match store.put_file(request).await {
            Ok(put) => {
                let commit = Commit::from(put);
                tracing::info!(%key, path, "committed tool module");
                Ok(commit)
            }
            Err(err) if err.is_conflict() => {
                tracing::warn!(%key, path, error = %err, "tool module write conflicted");
                Err(UpsertError::Conflict {
                    path: path.to_string(),
                    attempts: 1,
                    source: err,
                })
            }
            Err(err) if err.is_unconfirmed() => {
                tracing::warn!(%key, path, error = %err, "tool module write not confirmed");
                Err(UpsertError::Unconfirmed {
                    path: path.to_string(),
                    source: err,
                })
            }
            Err(err) => Err(UpsertError::Write {
                path: path.to_string(),
                source: err,
            }),
        }
    }
}
