//! toolforge Scaffold
//!
//! Source generation for new dashboard tools. A preset is picked from the
//! key, label and description, then its template is rendered with every
//! user-supplied value escaped as string-literal data.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolforge_manifest::ToolKey;
//!
//! let key = ToolKey::normalize("invoice_gen")?;
//! let scaffold = toolforge_scaffold::render(&key, "Invoice Generator", "")?;
//! assert_eq!(scaffold.file_name, "invoice_gen.py");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod preset;

pub mod template;

pub use error::ScaffoldError;
pub use preset::{
    render, render_preset, Preset, Scaffold, DEFAULT_DESCRIPTION, MODULE_EXTENSION,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
