//! Error types for the manifest model
//!
//! Covers:
//! - Key validation
//! - Decoding (UTF-8, YAML syntax, document shape, records)
//! - Encoding back to canonical YAML

/// Errors produced while validating, decoding or encoding a manifest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// Key is empty once normalised
    #[error("invalid key '{raw}': nothing left after normalisation")]
    InvalidKey { raw: String },

    /// Content is not UTF-8
    #[error("manifest is not valid UTF-8: {0}")]
    Utf8(String),

    /// Content is not parseable YAML
    #[error("manifest is not valid YAML: {0}")]
    Syntax(String),

    /// Document root or `tools` field has the wrong shape
    #[error("unexpected manifest shape: {0}")]
    Shape(String),

    /// A single entry could not be read as a record
    #[error("invalid record at entry {index}: {message}")]
    InvalidRecord { index: usize, message: String },

    /// Two entries share a key
    #[error("duplicate key '{key}' at entries {first} and {second}")]
    DuplicateKey {
        key: String,
        first: usize,
        second: usize,
    },

    /// Serialising the manifest failed
    #[error("failed to serialize manifest: {0}")]
    Encode(String),
}

impl ManifestError {
    /// Create invalid key error
    pub fn invalid_key(raw: impl Into<String>) -> Self {
        Self::InvalidKey { raw: raw.into() }
    }

    /// Create invalid record error for a 1-based entry index
    pub fn invalid_record(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            message: message.into(),
        }
    }

    /// Whether the error came from reading manifest content
    #[inline]
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Utf8(_)
                | Self::Syntax(_)
                | Self::Shape(_)
                | Self::InvalidRecord { .. }
                | Self::DuplicateKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_problem() {
        let err = ManifestError::DuplicateKey {
            key: "notes".to_string(),
            first: 1,
            second: 3,
        };
        assert_eq!(err.to_string(), "duplicate key 'notes' at entries 1 and 3");

        let err = ManifestError::invalid_record(2, "missing field `module`");
        assert!(err.to_string().contains("entry 2"));
    }

    #[test]
    fn decode_classification() {
        assert!(ManifestError::Syntax("bad".into()).is_decode());
        assert!(ManifestError::Shape("bad".into()).is_decode());
        assert!(!ManifestError::invalid_key("!!!").is_decode());
        assert!(!ManifestError::Encode("bad".into()).is_decode());
    }
}
