//! Opaque version tags

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Revision token assigned by a store on every successful write
///
/// Compared only for equality; its contents mean nothing to callers.
/// GitHub uses the blob SHA, [`MemoryStore`](crate::MemoryStore) a blake3
/// digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Wrap a store-provided token
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Token as sent back to the store
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for logs
    #[inline]
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }

    /// Digest-based tag for `content` at `generation`
    pub(crate) fn mint(generation: u64, content: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&generation.to_le_bytes());
        hasher.update(content);
        Self(hex::encode(&hasher.finalize().as_bytes()[..20]))
    }
}

impl Display for VersionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
