//! Error types for upserts
//!
//! Callers branch on the variant: validation problems need different
//! input, fetch problems mean the remote could not be read, conflicts mean
//! someone else won a race and a later retry will likely succeed.

use toolforge_manifest::ManifestError;
use toolforge_scaffold::ScaffoldError;
use toolforge_store::StoreError;

/// Upsert errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpsertError {
    /// Key is empty once normalised
    #[error("invalid key '{raw}'")]
    InvalidKey { raw: String },

    /// Label is empty once trimmed
    #[error("label must not be empty")]
    InvalidLabel,

    /// Manifest could not be read
    #[error("failed to fetch '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: StoreError,
    },

    /// Manifest was read but its content is not a valid manifest
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: ManifestError,
    },

    /// Conditional write rejected and not (or no longer) retried
    #[error("conflicting change to '{path}' after {attempts} attempt(s)")]
    Conflict {
        path: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Write failed for a reason other than a conflict
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: StoreError,
    },

    /// Store accepted the write but did not confirm it
    #[error("write to '{path}' not confirmed: {source}")]
    Unconfirmed {
        path: String,
        #[source]
        source: StoreError,
    },

    /// Merged manifest could not be serialised
    #[error("failed to encode manifest: {0}")]
    Encode(#[source] ManifestError),

    /// Tool module could not be generated
    #[error("failed to render tool module: {0}")]
    Scaffold(#[from] ScaffoldError),
}

impl UpsertError {
    /// Check if the request was rejected before any remote call
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidKey { .. } | Self::InvalidLabel)
    }

    /// Check if the manifest could not be read (decode included)
    #[inline]
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Decode { .. })
    }

    /// Check if a concurrent change defeated the write
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Message suitable for the person who asked for the change
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidKey { raw } => format!(
                "Tool key '{raw}' must contain at least one letter or digit."
            ),
            Self::InvalidLabel => "Tool label must not be empty.".to_string(),
            Self::Fetch { path, source } => {
                format!("Could not read {path} from the repository: {source}")
            }
            Self::Decode { path, source } => {
                format!("Could not read {path}: the file is not a valid tool manifest ({source})")
            }
            Self::Conflict { path, .. } => format!(
                "{path} was changed by someone else at the same time. Please retry."
            ),
            Self::Write { path, source } => {
                format!("Could not write {path} to the repository: {source}")
            }
            Self::Unconfirmed { path, .. } => format!(
                "The change to {path} may have been saved, but the repository's reply could not be read. Check {path} before retrying."
            ),
            Self::Encode(source) => format!("Could not serialise the manifest: {source}"),
            Self::Scaffold(source) => format!("Could not generate the tool module: {source}"),
        }
    }
}

impl From<ManifestError> for UpsertError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::InvalidKey { raw } => Self::InvalidKey { raw },
            other => Self::Encode(other),
        }
    }
}
