//! toolforge Manifest
//!
//! The shared tool registry (`tools.yaml`) as a typed value.
//!
//! # Core Concepts
//!
//! - [`Record`]: one tool entry, uniquely identified by its key
//! - [`Manifest`]: ordered records plus any other top-level document keys
//! - [`ToolKey`]: a normalised, non-empty record key
//! - [`MergeEffect`]: what an in-memory upsert did to the manifest
//!
//! # Example
//!
//! ```rust,ignore
//! use toolforge_manifest::{Manifest, Record, ToolKey};
//!
//! let mut manifest = Manifest::parse("tools: []\n")?;
//! let key = ToolKey::normalize("Invoice Gen")?;
//! manifest.upsert(Record::new(&key, "Invoice Generator", key.default_target()));
//! let text = manifest.to_yaml()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod codec;
mod error;
mod key;
mod manifest;
mod record;

pub mod lint;

// Re-exports
pub use codec::TOOLS_FIELD;
pub use error::ManifestError;
pub use key::ToolKey;
pub use lint::{lint, LintIssue, LintKind};
pub use manifest::{Manifest, MergeEffect};
pub use record::{Record, Tier, SECTION_FIELD, TIER_FIELD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
