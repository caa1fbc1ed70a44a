//! toolforge Upsert
//!
//! Adds or updates one record in the shared tool manifest held in a remote
//! versioned file store, without losing concurrent edits.
//!
//! # Protocol
//!
//! ```text
//! validate ─▶ fetch (content, tag) ─▶ merge in memory ─▶ conditional write
//!                  ▲                                          │
//!                  └────────── conflict, retry once ◀─────────┘
//! ```
//!
//! The write is conditioned on the tag that was read (or on the file not
//! existing), so a concurrent writer causes a conflict instead of a silent
//! overwrite.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolforge_store::MemoryStore;
//! use toolforge_upsert::{ManifestUpserter, UpsertConfig};
//!
//! let upserter = ManifestUpserter::new(MemoryStore::new(), UpsertConfig::default());
//! let outcome = upserter.upsert("invoice_gen", "Invoice Generator", "tools.invoice_gen").await?;
//! println!("{}", outcome.message());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod builder;
mod config;
mod error;
mod outcome;
mod upserter;

// Re-exports
pub use builder::{BuildOutcome, ToolBuilder, ToolRequest};
pub use config::{ConflictRetry, UpsertConfig};
pub use error::UpsertError;
pub use outcome::{Commit, UpsertOutcome};
pub use upserter::{FetchedManifest, ManifestUpserter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
