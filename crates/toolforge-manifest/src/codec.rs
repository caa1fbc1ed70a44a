//! YAML codec for the manifest
//!
//! Reading is lenient about emptiness (no text, `null`, no `tools` field,
//! `tools: null` all mean "no records") and also accepts a bare list of
//! records. Writing always produces the canonical mapping form with
//! `tools` first, so diffs stay minimal.

use crate::error::ManifestError;
use crate::manifest::Manifest;
use crate::record::Record;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Top-level field holding the record list
pub const TOOLS_FIELD: &str = "tools";

/// Canonical document layout used for serialisation
#[derive(Serialize)]
struct Document<'a> {
    tools: &'a [Record],
    #[serde(flatten)]
    extra: &'a Mapping,
}

impl Manifest {
    /// Parse manifest text
    ///
    /// # Errors
    /// - `ManifestError::Syntax` if the text is not YAML
    /// - `ManifestError::Shape` if the root or `tools` has the wrong type
    /// - `ManifestError::InvalidRecord` if an entry is not a record
    /// - `ManifestError::DuplicateKey` if two entries share a key
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }

        let root: Value =
            serde_yaml::from_str(text).map_err(|e| ManifestError::Syntax(e.to_string()))?;

        let (entries, extra) = split_document(root)?;

        let records = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| decode_record(idx + 1, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let manifest = Self::from_parts(records, extra)?;
        tracing::trace!(records = manifest.len(), "parsed manifest");
        Ok(manifest)
    }

    /// Parse manifest bytes as fetched from a store
    ///
    /// # Errors
    /// Returns `ManifestError::Utf8` for non-UTF-8 content, otherwise as
    /// [`Manifest::parse`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ManifestError::Utf8(e.to_string()))?;
        Self::parse(text)
    }

    /// Serialise to canonical YAML
    ///
    /// # Errors
    /// Returns `ManifestError::Encode` if the YAML emitter fails.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        let document = Document {
            tools: self.records(),
            extra: self.extra(),
        };
        serde_yaml::to_string(&document).map_err(|e| ManifestError::Encode(e.to_string()))
    }
}

/// Split a document into record entries and the remaining top-level keys
fn split_document(root: Value) -> Result<(Vec<Value>, Mapping), ManifestError> {
    match root {
        Value::Null => Ok((Vec::new(), Mapping::new())),
        Value::Sequence(entries) => Ok((entries, Mapping::new())),
        Value::Mapping(map) => {
            let mut tools = None;
            let mut extra = Mapping::new();
            for (field, value) in map {
                if field.as_str() == Some(TOOLS_FIELD) {
                    tools = Some(value);
                } else {
                    extra.insert(field, value);
                }
            }
            let entries = match tools {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Sequence(entries)) => entries,
                Some(other) => {
                    return Err(ManifestError::Shape(format!(
                        "`{TOOLS_FIELD}` must be a list, found {}",
                        kind_of(&other)
                    )))
                }
            };
            Ok((entries, extra))
        }
        other => Err(ManifestError::Shape(format!(
            "document root must be a mapping or a list, found {}",
            kind_of(&other)
        ))),
    }
}

fn decode_record(index: usize, entry: Value) -> Result<Record, ManifestError> {
    if !entry.is_mapping() {
        return Err(ManifestError::invalid_record(
            index,
            format!("expected a mapping, found {}", kind_of(&entry)),
        ));
    }
    serde_yaml::from_value(entry).map_err(|e| ManifestError::invalid_record(index, e.to_string()))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ToolKey;
    use pretty_assertions::assert_eq;

    fn record(key: &str, label: &str, target: &str) -> Record {
        Record::new(&ToolKey::normalize(key).unwrap(), label, target)
    }

    #[test]
    fn empty_inputs_are_empty_manifests() {
        for text in ["", "   \n", "~", "null", "{}", "tools:", "tools: null", "tools: []"] {
            let manifest = Manifest::parse(text).unwrap();
            assert!(manifest.is_empty(), "{text:?} should parse as empty");
        }
    }

    #[test]
    fn parses_mapping_form() {
        let text = "\
tools:
- key: invoice_gen
  label: Invoice Generator
  module: tools.invoice_gen
- key: notes
  label: Notes
  module: tools.notes
  tier: paid
  section: Writing
";
        let manifest = Manifest::parse(text).unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.records()[0], record("invoice_gen", "Invoice Generator", "tools.invoice_gen"));
        let notes = manifest.get("notes").unwrap();
        assert_eq!(notes.extra_str("tier"), Some("paid"));
        assert_eq!(notes.section(), Some("Writing"));
    }

    #[test]
    fn parses_bare_list_form() {
        let text = "- key: a\n  label: A\n  module: tools.a\n";
        let manifest = Manifest::parse(text).unwrap();
        assert_eq!(manifest.records(), &[record("a", "A", "tools.a")]);
    }

    #[test]
    fn missing_label_defaults_to_empty() {
        let manifest = Manifest::parse("tools:\n- key: a\n  module: tools.a\n").unwrap();
        assert_eq!(manifest.get("a").unwrap().label, "");
    }

    #[test]
    fn blank_and_scalar_labels_are_read_as_text() {
        let manifest = Manifest::parse(
            "tools:\n- key: a\n  label:\n  module: tools.a\n- key: b\n  label: 2024\n  module: tools.b\n- key: c\n  label: true\n  module: tools.c\n",
        )
        .unwrap();

        assert_eq!(manifest.get("a").unwrap().label, "");
        assert_eq!(manifest.get("b").unwrap().label, "2024");
        assert_eq!(manifest.get("c").unwrap().label, "true");
    }

    #[test]
    fn structured_label_is_rejected() {
        let err = Manifest::parse("tools:\n- key: a\n  label: [x]\n  module: tools.a\n").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn serialises_canonical_form() {
        let manifest = Manifest::from_records(vec![record(
            "invoice_gen",
            "Invoice Generator",
            "tools.invoice_gen",
        )])
        .unwrap();

        assert_eq!(
            manifest.to_yaml().unwrap(),
            "tools:\n- key: invoice_gen\n  label: Invoice Generator\n  module: tools.invoice_gen\n"
        );
    }

    #[test]
    fn empty_manifest_serialises_empty_list() {
        let yaml = Manifest::new().to_yaml().unwrap();
        assert_eq!(Manifest::parse(&yaml).unwrap(), Manifest::new());
        assert!(yaml.starts_with("tools:"));
    }

    #[test]
    fn preserves_other_top_level_keys() {
        let text = "version: 2\ntools:\n- key: a\n  label: A\n  module: tools.a\nowner: ops\n";
        let manifest = Manifest::parse(text).unwrap();
        let yaml = manifest.to_yaml().unwrap();
        let reparsed = Manifest::parse(&yaml).unwrap();

        assert_eq!(reparsed, manifest);
        assert!(yaml.starts_with("tools:"));
        let extra: Vec<_> = reparsed.extra().keys().filter_map(Value::as_str).collect();
        assert_eq!(extra, vec!["version", "owner"]);
    }

    #[test]
    fn extra_record_fields_follow_owned_fields() {
        let text = "tools:\n- tier: paid\n  module: tools.a\n  key: a\n  label: A\n";
        let yaml = Manifest::parse(text).unwrap().to_yaml().unwrap();
        assert_eq!(
            yaml,
            "tools:\n- key: a\n  label: A\n  module: tools.a\n  tier: paid\n"
        );
    }

    #[test]
    fn serialisation_is_stable() {
        let text = "tools:\n- key: a\n  label: A\n  module: tools.a\n  section: Ops\n";
        let once = Manifest::parse(text).unwrap().to_yaml().unwrap();
        let twice = Manifest::parse(&once).unwrap().to_yaml().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(Manifest::parse("42"), Err(ManifestError::Shape(_))));
        assert!(matches!(Manifest::parse("just text"), Err(ManifestError::Shape(_))));
        assert!(matches!(Manifest::parse("tools: 7"), Err(ManifestError::Shape(_))));
        assert!(matches!(
            Manifest::parse("tools: {key: a}"),
            Err(ManifestError::Shape(_))
        ));
    }

    #[test]
    fn rejects_bad_records() {
        let err = Manifest::parse("tools:\n- key: a\n  label: A\n").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRecord { index: 1, .. }));

        let err = Manifest::parse("tools:\n- key: a\n  module: tools.a\n- oops\n").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRecord { index: 2, .. }));

        let err = Manifest::parse("tools:\n- key: [1]\n  module: tools.a\n").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let text = "tools:\n- {key: a, module: tools.a}\n- {key: a, module: tools.b}\n";
        assert!(matches!(
            Manifest::parse(text),
            Err(ManifestError::DuplicateKey { first: 1, second: 2, .. })
        ));
    }

    #[test]
    fn rejects_invalid_yaml_and_utf8() {
        assert!(matches!(Manifest::parse("tools: [\n"), Err(ManifestError::Syntax(_))));
        assert!(matches!(
            Manifest::from_bytes(&[0xff, 0xfe, 0x00]),
            Err(ManifestError::Utf8(_))
        ));
    }
}
