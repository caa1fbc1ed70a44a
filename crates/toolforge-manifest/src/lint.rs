//! Manifest lint
//!
//! Works on the raw YAML value, so it can report every problem in a file
//! the strict decoder would reject at the first one.

use crate::codec::{kind_of, TOOLS_FIELD};
use crate::key::ToolKey;
use crate::record::{Tier, TIER_FIELD};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// 1-based entry index, `None` for document-level issues
    pub entry: Option<usize>,
    /// What is wrong
    pub kind: LintKind,
}

/// Kinds of lint findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintKind {
    /// Text is not YAML
    Unparseable(String),
    /// Root is neither a mapping nor a list
    BadRoot(&'static str),
    /// `tools` is present but not a list
    ToolsNotList(&'static str),
    /// Entry is not a mapping
    EntryNotMapping(&'static str),
    /// Entry has no string `key`
    MissingKey,
    /// Entry has no string `module`
    MissingModule,
    /// Entry has no label or an empty one
    MissingLabel,
    /// Label is a list or mapping
    LabelNotText(&'static str),
    /// Key already used by an earlier entry
    DuplicateKey { key: String, first: usize },
    /// Key is not in normalised form
    UnnormalizedKey { key: String },
    /// Tier is not `free` or `paid`
    UnknownTier(String),
}

impl LintIssue {
    fn document(kind: LintKind) -> Self {
        Self { entry: None, kind }
    }

    fn entry(index: usize, kind: LintKind) -> Self {
        Self {
            entry: Some(index),
            kind,
        }
    }

    /// Whether the strict decoder would reject the file because of this
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.kind,
            LintKind::MissingLabel | LintKind::UnnormalizedKey { .. } | LintKind::UnknownTier(_)
        )
    }
}

impl Display for LintIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(entry) = self.entry {
            write!(f, "[{entry}] ")?;
        }
        match &self.kind {
            LintKind::Unparseable(msg) => write!(f, "not valid YAML: {msg}"),
            LintKind::BadRoot(kind) => write!(f, "document must be a list or a mapping with `{TOOLS_FIELD}`, found {kind}"),
            LintKind::ToolsNotList(kind) => write!(f, "`{TOOLS_FIELD}` must be a list, found {kind}"),
            LintKind::EntryNotMapping(kind) => write!(f, "entry must be a mapping, found {kind}"),
            LintKind::MissingKey => f.write_str("missing key"),
            LintKind::MissingModule => f.write_str("missing module"),
            LintKind::MissingLabel => f.write_str("missing label"),
            LintKind::LabelNotText(kind) => write!(f, "label must be text, found {kind}"),
            LintKind::DuplicateKey { key, first } => {
                write!(f, "duplicate key '{key}' (first used by entry {first})")
            }
            LintKind::UnnormalizedKey { key } => write!(f, "key '{key}' is not normalised"),
            LintKind::UnknownTier(tier) => write!(f, "unknown tier '{tier}'"),
        }
    }
}

/// Lint manifest text
#[must_use]
pub fn lint(text: &str) -> Vec<LintIssue> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let root: Value = match serde_yaml::from_str(text) {
        Ok(root) => root,
        Err(e) => return vec![LintIssue::document(LintKind::Unparseable(e.to_string()))],
    };

    let entries = match &root {
        Value::Null => return Vec::new(),
        Value::Sequence(entries) => entries,
        Value::Mapping(map) => match map.get(TOOLS_FIELD) {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Sequence(entries)) => entries,
            Some(other) => {
                return vec![LintIssue::document(LintKind::ToolsNotList(kind_of(other)))]
            }
        },
        other => return vec![LintIssue::document(LintKind::BadRoot(kind_of(other)))],
    };

    let mut issues = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        let index = idx + 1;
        let Value::Mapping(fields) = entry else {
            issues.push(LintIssue::entry(index, LintKind::EntryNotMapping(kind_of(entry))));
            continue;
        };

        let key = fields.get("key").and_then(Value::as_str).filter(|k| !k.is_empty());
        let module = fields.get("module").and_then(Value::as_str).filter(|m| !m.is_empty());

        if module.is_none() {
            issues.push(LintIssue::entry(index, LintKind::MissingModule));
        }
        match fields.get("label") {
            None | Some(Value::Null) => {
                issues.push(LintIssue::entry(index, LintKind::MissingLabel));
            }
            Some(Value::String(label)) if label.trim().is_empty() => {
                issues.push(LintIssue::entry(index, LintKind::MissingLabel));
            }
            Some(other @ (Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_))) => {
                issues.push(LintIssue::entry(index, LintKind::LabelNotText(kind_of(other))));
            }
            Some(_) => {}
        }
        if let Some(tier) = fields.get(TIER_FIELD).and_then(Value::as_str) {
            if !Tier::is_known(tier) {
                issues.push(LintIssue::entry(index, LintKind::UnknownTier(tier.to_string())));
            }
        }

        let Some(key) = key else {
            issues.push(LintIssue::entry(index, LintKind::MissingKey));
            continue;
        };
        if !ToolKey::is_normalized(key) {
            issues.push(LintIssue::entry(
                index,
                LintKind::UnnormalizedKey {
                    key: key.to_string(),
                },
            ));
        }
        if let Some(&first) = seen.get(key) {
            issues.push(LintIssue::entry(
                index,
                LintKind::DuplicateKey {
                    key: key.to_string(),
                    first,
                },
            ));
        } else {
            seen.insert(key, index);
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(Option<usize>, LintKind)> {
        lint(text).into_iter().map(|i| (i.entry, i.kind)).collect()
    }

    #[test]
    fn clean_manifest_has_no_issues() {
        let text = "tools:\n- key: a\n  label: A\n  module: tools.a\n  tier: paid\n";
        assert!(lint(text).is_empty());
        assert!(lint("").is_empty());
        assert!(lint("tools:").is_empty());
    }

    #[test]
    fn reports_every_entry_problem() {
        let text = "\
tools:
- key: a
  label: A
  module: tools.a
- label: No key
  module: tools.x
- key: a
  module: tools.a2
- key: Bad-Key
  label: Bad
  module: tools.bad
  tier: gold
- 12
";
        assert_eq!(
            kinds(text),
            vec![
                (Some(2), LintKind::MissingKey),
                (Some(3), LintKind::MissingLabel),
                (
                    Some(3),
                    LintKind::DuplicateKey {
                        key: "a".to_string(),
                        first: 1
                    }
                ),
                (Some(4), LintKind::UnknownTier("gold".to_string())),
                (
                    Some(4),
                    LintKind::UnnormalizedKey {
                        key: "Bad-Key".to_string()
                    }
                ),
                (Some(5), LintKind::EntryNotMapping("a number")),
            ]
        );
    }

    #[test]
    fn reports_document_problems() {
        assert_eq!(kinds("tools: 3"), vec![(None, LintKind::ToolsNotList("a number"))]);
        assert_eq!(kinds("hello"), vec![(None, LintKind::BadRoot("a string"))]);
        assert!(matches!(kinds("tools: [")[0].1, LintKind::Unparseable(_)));
    }

    #[test]
    fn fatal_classification() {
        let issues = lint("tools:\n- key: a\n  module: tools.a\n- key: a\n  label: A\n");
        let fatal: Vec<_> = issues.iter().filter(|i| i.is_fatal()).collect();
        // missing module + duplicate key are fatal, missing label is not
        assert_eq!(fatal.len(), 2);
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn lint_agrees_with_decoder_on_labels() {
        for text in [
            "tools:\n- key: a\n  label:\n  module: tools.a\n",
            "tools:\n- key: a\n  label: 2024\n  module: tools.a\n",
            "tools:\n- key: a\n  label: [x]\n  module: tools.a\n",
            "tools:\n- key: a\n  label: {x: 1}\n  module: tools.a\n",
        ] {
            let fatal = lint(text).iter().any(LintIssue::is_fatal);
            assert_eq!(fatal, crate::Manifest::parse(text).is_err(), "{text}");
        }
    }

    #[test]
    fn blank_label_is_a_warning_and_structured_label_an_error() {
        assert_eq!(
            kinds("tools:\n- key: a\n  label:\n  module: tools.a\n"),
            vec![(Some(1), LintKind::MissingLabel)]
        );
        assert!(kinds("tools:\n- key: a\n  label: 2024\n  module: tools.a\n").is_empty());
        assert_eq!(
            kinds("tools:\n- key: a\n  label: [x]\n  module: tools.a\n"),
            vec![(Some(1), LintKind::LabelNotText("a list"))]
        );
    }

    #[test]
    fn display_prefixes_entry_index() {
        let issue = LintIssue::entry(
            4,
            LintKind::DuplicateKey {
                key: "a".to_string(),
                first: 1,
            },
        );
        assert_eq!(issue.to_string(), "[4] duplicate key 'a' (first used by entry 1)");
    }
}
