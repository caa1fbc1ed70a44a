//! toolforge CLI support
//!
//! Configuration loading and output formatting for the `toolforge`
//! binary, kept in a library so they can be tested without a terminal.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod report;

pub use config::{ForgeConfig, StoreSection, DEFAULT_CONFIG_FILE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
