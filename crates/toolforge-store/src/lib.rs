//! toolforge Store
//!
//! Remote versioned file stores: every read returns an opaque
//! [`VersionTag`], every write can be conditioned on one.
//!
//! # Architecture
//!
//! ```text
//! caller → VersionedStore::get_file  → (content, tag) | not found
//!        → VersionedStore::put_file  → Created | Updated | Conflict
//!                 ↑
//!      MemoryStore (in-process) / GitHubStore (contents API)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use toolforge_store::{MemoryStore, PutRequest, VersionedStore, WriteCondition};
//!
//! let store = MemoryStore::new();
//! let created = store
//!     .put_file(PutRequest::new("tools.yaml", b"tools: []\n".to_vec(), WriteCondition::CreateOnly))
//!     .await?;
//! let file = store.get_file("tools.yaml").await?.expect("just created");
//! assert_eq!(&file.version, created.version());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod store;
mod version;

pub mod github;
pub mod memory;

// Re-exports
pub use error::StoreError;
pub use github::{GitHubConfig, GitHubStore};
pub use memory::{MemoryStore, StoreStats};
pub use store::{PutOutcome, PutRequest, StoredFile, VersionedStore, WriteCondition};
pub use version::VersionTag;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
