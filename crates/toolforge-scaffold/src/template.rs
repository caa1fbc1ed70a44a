//! Minimal template renderer
//!
//! Templates are fixed resources compiled into the binary. Placeholders
//! look like `{{name}}` or `{{name|filter}}`; every interpolated value is
//! escaped by its filter, so user input is only ever data inside a string
//! literal of the generated module.
//!
//! Filters:
//! - `str` (default): body of a double-quoted string literal
//! - `fstr`: body of a double-quoted f-string literal (braces doubled)

use crate::error::ScaffoldError;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A named template resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Resource name, for errors
    pub name: &'static str,
    /// Template text
    pub source: &'static str,
}

/// Values available to placeholders
pub type Vars<'a> = BTreeMap<&'static str, &'a str>;

impl Template {
    /// Render with `vars`
    ///
    /// # Errors
    /// - `ScaffoldError::Unterminated` for a `{{` without `}}`
    /// - `ScaffoldError::UnknownPlaceholder` for a name missing from `vars`
    /// - `ScaffoldError::UnknownFilter` for a filter other than `str`/`fstr`
    pub fn render(&self, vars: &Vars<'_>) -> Result<String, ScaffoldError> {
        let mut out = String::with_capacity(self.source.len() + 64);
        let mut rest = self.source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or(ScaffoldError::Unterminated {
                template: self.name,
                offset: offset + start,
            })?;

            let inner = after_open[..end].trim();
            let (name, filter) = match inner.split_once('|') {
                Some((name, filter)) => (name.trim(), filter.trim()),
                None => (inner, "str"),
            };
            let value = vars.get(name).ok_or_else(|| ScaffoldError::UnknownPlaceholder {
                template: self.name,
                name: name.to_string(),
            })?;
            match filter {
                "str" => escape_str_into(&mut out, value, false),
                "fstr" => escape_str_into(&mut out, value, true),
                other => {
                    return Err(ScaffoldError::UnknownFilter {
                        template: self.name,
                        filter: other.to_string(),
                    })
                }
            }

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Escape `value` for a double-quoted string literal
#[must_use]
pub fn escape_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_str_into(&mut out, value, false);
    out
}

/// Escape `value` for a double-quoted f-string literal
#[must_use]
pub fn escape_fstr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_str_into(&mut out, value, true);
    out
}

fn escape_str_into(out: &mut String, value: &str, format_braces: bool) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '{' if format_braces => out.push_str("{{"),
            '}' if format_braces => out.push_str("}}"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(source: &'static str) -> Template {
        Template {
            name: "test",
            source,
        }
    }

    fn vars<'a>(pairs: &[(&'static str, &'a str)]) -> Vars<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitutes_placeholders() {
        let rendered = template("st.header(\"{{label}}\") # {{ key }}")
            .render(&vars(&[("label", "Notes"), ("key", "notes")]))
            .unwrap();
        assert_eq!(rendered, "st.header(\"Notes\") # notes");
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let source = "x = {\"a\": 1}\nprint(f\"{x}\")\n";
        assert_eq!(template(source).render(&Vars::new()).unwrap(), source);
    }

    #[test]
    fn str_filter_escapes_quotes_and_control_characters() {
        assert_eq!(escape_str(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escape_str("a\nb\tc\r"), "a\\nb\\tc\\r");
        assert_eq!(escape_str("bell\u{7}"), "bell\\u0007");
        assert_eq!(escape_str("{braces}"), "{braces}");
    }

    #[test]
    fn fstr_filter_doubles_braces() {
        assert_eq!(escape_fstr("{__import__('os')}"), "{{__import__('os')}}");
        assert_eq!(escape_fstr("\"{x}\""), "\\\"{{x}}\\\"");
    }

    #[test]
    fn injected_code_stays_inside_the_literal() {
        let rendered = template("st.header(\"{{label}}\")")
            .render(&vars(&[("label", "\"); import os; os.system(\"id\"); (\"")]))
            .unwrap();
        assert_eq!(
            rendered,
            "st.header(\"\\\"); import os; os.system(\\\"id\\\"); (\\\"\")"
        );
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = template("{{missing}}").render(&Vars::new()).unwrap_err();
        assert_eq!(
            err,
            ScaffoldError::UnknownPlaceholder {
                template: "test",
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let err = template("{{label|raw}}")
            .render(&vars(&[("label", "x")]))
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::UnknownFilter { ref filter, .. } if filter == "raw"));
    }

    #[test]
    fn unterminated_placeholder_reports_offset() {
        let err = template("ok {{label} and more")
            .render(&vars(&[("label", "x")]))
            .unwrap_err();
        assert_eq!(
            err,
            ScaffoldError::Unterminated {
                template: "test",
                offset: 3
            }
        );
    }
}
