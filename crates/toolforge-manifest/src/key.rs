//! Record keys
//!
//! Provides [`ToolKey`], the validated form of a user-supplied key.

use crate::error::ManifestError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Module path prefix used by the dashboard for tool modules
pub const TARGET_PREFIX: &str = "tools";

/// A normalised, non-empty record key
///
/// Normalisation lower-cases the input, drops every character that is not
/// an ASCII letter, digit or underscore, then trims underscores from both
/// ends.
///
/// # Examples
/// - `"Invoice_Gen"` → `invoice_gen`
/// - `"  _bar-tools_ "` → `bartools`
/// - `"!!!"` → rejected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolKey(String);

impl ToolKey {
    /// Normalise a raw key
    ///
    /// # Errors
    /// Returns [`ManifestError::InvalidKey`] if nothing is left after
    /// normalisation.
    pub fn normalize(raw: &str) -> Result<Self, ManifestError> {
        let normalized = normalized_form(raw);
        if normalized.is_empty() {
            return Err(ManifestError::invalid_key(raw));
        }
        Ok(Self(normalized))
    }

    /// Whether `raw` is already in normalised form
    #[must_use]
    pub fn is_normalized(raw: &str) -> bool {
        !raw.is_empty() && normalized_form(raw) == raw
    }

    /// Get the key as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Module path the dashboard expects for this key (`tools.<key>`)
    #[inline]
    #[must_use]
    pub fn default_target(&self) -> String {
        format!("{TARGET_PREFIX}.{}", self.0)
    }

    /// Consume into the inner string
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn normalized_form(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    kept.trim_matches('_').to_string()
}

impl Display for ToolKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ToolKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ToolKey {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}
