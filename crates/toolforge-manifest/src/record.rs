//! Manifest records
//!
//! A [`Record`] is one tool entry. The three fields the upsert protocol
//! owns are typed; any other fields found in the file (`tier`, `section`,
//! ...) ride along untouched in [`Record::extra`].

use crate::codec::kind_of;
use crate::key::ToolKey;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

/// Field holding the access tier
pub const TIER_FIELD: &str = "tier";
/// Field holding the sidebar section
pub const SECTION_FIELD: &str = "section";

/// One tool entry in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique key within the manifest
    pub key: String,
    /// Display label; blank or scalar values are read as text
    #[serde(default, deserialize_with = "label_text")]
    pub label: String,
    /// Dotted module path the key resolves to
    #[serde(rename = "module")]
    pub target: String,
    /// Fields not owned by the upsert protocol, in file order
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Record {
    /// Create record for a validated key
    #[inline]
    #[must_use]
    pub fn new(key: &ToolKey, label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            key: key.as_str().to_string(),
            label: label.into(),
            target: target.into(),
            extra: Mapping::new(),
        }
    }

    /// Set an extra field, keeping its position if already present
    #[must_use]
    pub fn with_extra(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(Value::String(field.to_string()), value.into());
        self
    }

    /// Raw string value of an extra field
    #[must_use]
    pub fn extra_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(Value::as_str)
    }

    /// Access tier (`free` unless the entry says otherwise)
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.extra_str(TIER_FIELD).map_or(Tier::Free, Tier::parse)
    }

    /// Sidebar section, if any
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.extra_str(SECTION_FIELD)
    }

    /// Whether label and target already match `other`'s
    ///
    /// Extras on `other` must also be present here with the same value.
    #[must_use]
    pub fn covers(&self, other: &Record) -> bool {
        self.label == other.label
            && self.target == other.target
            && other
                .extra
                .iter()
                .all(|(field, value)| self.extra.get(field) == Some(value))
    }

    /// Overwrite label, target and any extras carried by `incoming`
    pub(crate) fn absorb(&mut self, incoming: Record) {
        self.label = incoming.label;
        self.target = incoming.target;
        for (field, value) in incoming.extra {
            self.extra.insert(field, value);
        }
    }
}

/// Read a label the way the dashboard does: null is empty, scalars are text
fn label_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "label must be text, found {}",
            kind_of(&other)
        ))),
    }
}

/// Access tier of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Visible to everyone
    #[default]
    Free,
    /// Visible once paid tools are unlocked
    Paid,
}

impl Tier {
    /// Interpret a tier string; anything other than `free` is gated
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("free") {
            Self::Free
        } else {
            Self::Paid
        }
    }

    /// Whether `raw` is one of the spellings the dashboard knows
    #[must_use]
    pub fn is_known(raw: &str) -> bool {
        let raw = raw.trim();
        raw.eq_ignore_ascii_case("free") || raw.eq_ignore_ascii_case("paid")
    }

    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Paid => "paid",
        }
    }
}
