//! Upsert configuration

use serde::{Deserialize, Serialize};

/// Default manifest location in the repository
pub const DEFAULT_MANIFEST_PATH: &str = "tools.yaml";
/// Default directory for generated tool modules
pub const DEFAULT_TOOLS_DIR: &str = "streamlit_app/tools";
/// Default commit message prefix
pub const DEFAULT_COMMIT_PREFIX: &str = "toolforge";

/// When a rejected conditional write is retried
///
/// A retry is always a fresh fetch, a fresh merge and one more
/// conditional write. There is never more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRetry {
    /// Retry only when the manifest did not exist at fetch time
    #[default]
    CreateRaceOnly,
    /// Never retry
    Never,
    /// Retry create races and update races alike
    AnyConflict,
}

impl ConflictRetry {
    /// Whether a conflict on a write made with (or without) a tag is retried
    #[inline]
    #[must_use]
    pub fn allows(&self, had_version: bool) -> bool {
        match self {
            Self::CreateRaceOnly => !had_version,
            Self::Never => false,
            Self::AnyConflict => true,
        }
    }
}

/// Upsert configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertConfig {
    /// Repository path of the manifest
    pub manifest_path: String,
    /// Repository directory holding tool modules
    pub tools_dir: String,
    /// Retry discipline for conflicting writes
    pub conflict_retry: ConflictRetry,
    /// Prefix for commit messages; empty for none
    pub commit_prefix: String,
}

impl UpsertConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With manifest path
    #[inline]
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// With tools directory
    #[inline]
    #[must_use]
    pub fn with_tools_dir(mut self, dir: impl Into<String>) -> Self {
        self.tools_dir = dir.into();
        self
    }

    /// With conflict retry policy
    #[inline]
    #[must_use]
    pub fn with_conflict_retry(mut self, policy: ConflictRetry) -> Self {
        self.conflict_retry = policy;
        self
    }

    /// With commit message prefix
    #[inline]
    #[must_use]
    pub fn with_commit_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.commit_prefix = prefix.into();
        self
    }

    /// Commit message with the configured prefix
    #[must_use]
    pub fn commit_message(&self, summary: &str) -> String {
        match self.commit_prefix.trim() {
            "" => summary.to_string(),
            prefix => format!("{prefix}: {summary}"),
        }
    }
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            tools_dir: DEFAULT_TOOLS_DIR.to_string(),
            conflict_retry: ConflictRetry::default(),
            commit_prefix: DEFAULT_COMMIT_PREFIX.to_string(),
        }
    }
}
