//! Upsert results

use toolforge_manifest::{MergeEffect, ToolKey};
use toolforge_store::{PutOutcome, VersionTag};

/// What happened remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// File did not exist and was created
    Created(VersionTag),
    /// Existing file was replaced
    Updated(VersionTag),
    /// Nothing to write; the record was already up to date
    Skipped,
}

impl Commit {
    /// Tag of the new revision, if one was written
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&VersionTag> {
        match self {
            Self::Created(v) | Self::Updated(v) => Some(v),
            Self::Skipped => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_written(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl From<PutOutcome> for Commit {
    fn from(outcome: PutOutcome) -> Self {
        match outcome {
            PutOutcome::Created(v) => Self::Created(v),
            PutOutcome::Updated(v) => Self::Updated(v),
        }
    }
}

/// Successful upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Normalised key of the record
    pub key: ToolKey,
    /// What the merge did to the manifest
    pub effect: MergeEffect,
    /// What the store did
    pub commit: Commit,
    /// Fetch-merge-write cycles used (1 or 2)
    pub attempts: u32,
}

impl UpsertOutcome {
    /// Tag of the new revision, if one was written
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&VersionTag> {
        self.commit.version()
    }

    /// Human-readable summary
    #[must_use]
    pub fn message(&self) -> String {
        match self.effect {
            MergeEffect::Inserted => format!("Created tool '{}'.", self.key),
            MergeEffect::Replaced => format!("Updated tool '{}'.", self.key),
            MergeEffect::Unchanged => format!("Tool '{}' is already up to date.", self.key),
        }
    }
}
