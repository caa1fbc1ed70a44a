//! The versioned store seam
//!
//! Everything the upsert protocol needs from a remote file store: a read
//! that returns content plus a [`VersionTag`], and a write that can be
//! made conditional on one.

use crate::error::StoreError;
use crate::version::VersionTag;
use async_trait::async_trait;
use std::sync::Arc;

/// Default commit message for writes that do not set one
pub const DEFAULT_MESSAGE: &str = "Update via toolforge";

/// A file as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Raw file content
    pub content: Vec<u8>,
    /// Tag of the revision that was read
    pub version: VersionTag,
}

/// Precondition attached to a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Only succeed if the file does not exist yet
    CreateOnly,
    /// Only succeed if the current tag still equals this one
    IfMatch(VersionTag),
}

impl WriteCondition {
    /// Condition for overwriting what was read, or creating if nothing was
    #[inline]
    #[must_use]
    pub fn from_version(version: Option<&VersionTag>) -> Self {
        version.map_or(Self::CreateOnly, |v| Self::IfMatch(v.clone()))
    }

    /// Expected tag, if any
    #[inline]
    #[must_use]
    pub fn expected(&self) -> Option<&VersionTag> {
        match self {
            Self::CreateOnly => None,
            Self::IfMatch(v) => Some(v),
        }
    }
}

/// A conditional write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    /// Repository-relative path
    pub path: String,
    /// New file content
    pub content: Vec<u8>,
    /// Precondition
    pub condition: WriteCondition,
    /// Commit message
    pub message: String,
}

impl PutRequest {
    /// Create write request with the default commit message
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, content: Vec<u8>, condition: WriteCondition) -> Self {
        Self {
            path: path.into(),
            content,
            condition,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }

    /// With commit message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Successful write result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// File did not exist and was created
    Created(VersionTag),
    /// Existing file was replaced
    Updated(VersionTag),
}

impl PutOutcome {
    /// Tag minted by the write
    #[inline]
    #[must_use]
    pub fn version(&self) -> &VersionTag {
        match self {
            Self::Created(v) | Self::Updated(v) => v,
        }
    }

    /// Whether the write created the file
    #[inline]
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Remote file store with optimistic concurrency
///
/// Implementations must evaluate a write's [`WriteCondition`] atomically
/// with the write itself: either the precondition holds and the content is
/// replaced, or nothing changes and [`StoreError::Conflict`] is returned.
#[async_trait]
pub trait VersionedStore: Send + Sync {
    /// Read a file; `Ok(None)` when it does not exist
    ///
    /// # Errors
    /// Any failure other than "not found".
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError>;

    /// Write a file subject to `request.condition`
    ///
    /// # Errors
    /// - `StoreError::Conflict` if the precondition failed
    /// - other variants for transport, auth or status failures
    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError>;
}

#[async_trait]
impl<T: VersionedStore + ?Sized> VersionedStore for Arc<T> {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        (**self).get_file(path).await
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        (**self).put_file(request).await
    }
}

#[async_trait]
impl<'a, T: VersionedStore + ?Sized> VersionedStore for &'a T {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        (**self).get_file(path).await
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        (**self).put_file(request).await
    }
}

#[async_trait]
impl<T: VersionedStore + ?Sized> VersionedStore for Box<T> {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        (**self).get_file(path).await
    }

    async fn put_file(&self, request: PutRequest) -> Result<PutOutcome, StoreError> {
        (**self).put_file(request).await
    }
}
