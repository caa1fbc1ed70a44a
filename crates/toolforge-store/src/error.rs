//! Error types for remote stores

/// Store operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Conditional write rejected: the remote version moved
    #[error("write to '{path}' rejected by precondition: {detail}")]
    Conflict { path: String, detail: String },

    /// Credentials missing, expired or lacking permission
    #[error("store rejected credentials for '{path}' (status {status})")]
    Unauthorized { path: String, status: u16 },

    /// Any other non-success status
    #[error("store returned status {status} for '{path}': {detail}")]
    Status {
        path: String,
        status: u16,
        detail: String,
    },

    /// Connection, timeout or protocol failure
    #[error("transport error for '{path}': {detail}")]
    Transport { path: String, detail: String },

    /// Response body did not have the expected shape
    #[error("malformed store response for '{path}': {detail}")]
    Decode { path: String, detail: String },

    /// Write was accepted but its reply could not be read; the change may
    /// have landed without a known version
    #[error("write to '{path}' accepted but not confirmed: {detail}")]
    Unconfirmed { path: String, detail: String },

    /// Store cannot be built from its configuration
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Create conflict error
    pub fn conflict(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Conflict {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create status error
    pub fn status(path: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            path: path.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Create transport error
    pub fn transport(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transport {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create decode error
    pub fn decode(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create unconfirmed-write error
    pub fn unconfirmed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unconfirmed {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Check if a write may have landed even though it reported failure
    #[inline]
    #[must_use]
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self, Self::Unconfirmed { .. })
    }

    /// Check if the write lost an optimistic-concurrency race
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if repeating the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    #[inline]
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_predicate() {
        assert!(StoreError::conflict("tools.yaml", "sha mismatch").is_conflict());
        assert!(!StoreError::status("tools.yaml", 500, "boom").is_conflict());
    }

    #[test]
    fn retryable_errors() {
        assert!(StoreError::transport("tools.yaml", "reset").is_retryable());
        assert!(StoreError::status("tools.yaml", 502, "bad gateway").is_retryable());
        assert!(StoreError::status("tools.yaml", 429, "slow down").is_retryable());
        assert!(!StoreError::status("tools.yaml", 400, "bad").is_retryable());
        assert!(!StoreError::conflict("tools.yaml", "moved").is_retryable());
        assert!(!StoreError::unconfirmed("tools.yaml", "bad body").is_retryable());
    }

    #[test]
    fn status_accessor_and_display() {
        let err = StoreError::Unauthorized {
            path: "tools.yaml".to_string(),
            status: 401,
        };
        assert_eq!(err.http_status(), Some(401));
        assert_eq!(StoreError::Config("x".into()).http_status(), None);

        let err = StoreError::status("tools.yaml", 500, "boom");
        assert_eq!(err.to_string(), "store returned status 500 for 'tools.yaml': boom");
    }
}
