//! Tool presets and their templates

use crate::error::ScaffoldError;
use crate::template::{Template, Vars};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use toolforge_manifest::ToolKey;

/// Description used by the generic preset when none is given
pub const DEFAULT_DESCRIPTION: &str = "New tool created by the Tool Builder.";

/// Python module extension for generated tools
pub const MODULE_EXTENSION: &str = "py";

const INVOICE: Template = Template {
    name: "invoice.py.tmpl",
    source: include_str!("../templates/invoice.py.tmpl"),
};

const RESUME: Template = Template {
    name: "resume.py.tmpl",
    source: include_str!("../templates/resume.py.tmpl"),
};

const NOTES: Template = Template {
    name: "notes.py.tmpl",
    source: include_str!("../templates/notes.py.tmpl"),
};

const BAR_MENU: Template = Template {
    name: "bar_menu.py.tmpl",
    source: include_str!("../templates/bar_menu.py.tmpl"),
};

const GENERIC: Template = Template {
    name: "generic.py.tmpl",
    source: include_str!("../templates/generic.py.tmpl"),
};

/// Starting point for a new tool module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Invoice,
    Resume,
    Notes,
    BarMenu,
    #[default]
    Generic,
}

impl Preset {
    /// Every preset, in detection order
    pub const ALL: [Preset; 5] = [
        Preset::Invoice,
        Preset::Resume,
        Preset::Notes,
        Preset::BarMenu,
        Preset::Generic,
    ];

    /// Pick a preset from what the user typed
    ///
    /// Matches substrings of the lower-cased `key label description`, first
    /// hit wins.
    #[must_use]
    pub fn detect(key: &str, label: &str, description: &str) -> Self {
        let haystack = format!("{key} {label} {description}").to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

        if has(&["invoice"]) {
            Preset::Invoice
        } else if has(&["cv", "resume"]) {
            Preset::Resume
        } else if has(&["notes", "note"]) {
            Preset::Notes
        } else if has(&["bar", "menu", "cocktail", "drink"]) {
            Preset::BarMenu
        } else {
            Preset::Generic
        }
    }

    /// Stable name, as used on the command line
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Invoice => "invoice",
            Preset::Resume => "resume",
            Preset::Notes => "notes",
            Preset::BarMenu => "bar_menu",
            Preset::Generic => "generic",
        }
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> Template {
        match self {
            Preset::Invoice => INVOICE,
            Preset::Resume => RESUME,
            Preset::Notes => NOTES,
            Preset::BarMenu => BAR_MENU,
            Preset::Generic => GENERIC,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown preset '{s}'"))
    }
}

/// A rendered tool module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    pub preset: Preset,
    /// File name relative to the tools directory, `<key>.py`
    pub file_name: String,
    pub source: String,
}

impl Scaffold {
    /// Path of the module under `tools_dir`
    #[must_use]
    pub fn path_in(&self, tools_dir: &str) -> String {
        let dir = tools_dir.trim_end_matches('/');
        if dir.is_empty() {
            self.file_name.clone()
        } else {
            format!("{dir}/{}", self.file_name)
        }
    }
}

/// Render a new tool module, detecting the preset
///
/// # Errors
/// Returns `ScaffoldError` if a template resource is malformed.
pub fn render(key: &ToolKey, label: &str, description: &str) -> Result<Scaffold, ScaffoldError> {
    let preset = Preset::detect(key.as_str(), label, description);
    render_preset(preset, key, label, description)
}

/// Render a new tool module from an explicit preset
///
/// # Errors
/// Returns `ScaffoldError` if a template resource is malformed.
pub fn render_preset(
    preset: Preset,
    key: &ToolKey,
    label: &str,
    description: &str,
) -> Result<Scaffold, ScaffoldError> {
    let description = match description.trim() {
        "" => DEFAULT_DESCRIPTION,
        trimmed => trimmed,
    };

    let mut vars = Vars::new();
    vars.insert("key", key.as_str());
    vars.insert("label", label.trim());
    vars.insert("description", description);

    let source = preset.template().render(&vars)?;
    tracing::debug!(key = %key, %preset, bytes = source.len(), "rendered tool scaffold");

    Ok(Scaffold {
        preset,
        file_name: format!("{key}.{MODULE_EXTENSION}"),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(raw: &str) -> ToolKey {
        ToolKey::normalize(raw).unwrap()
    }

    #[test]
    fn detects_presets_in_order() {
        assert_eq!(Preset::detect("invoice_gen", "Invoice Generator", ""), Preset::Invoice);
        assert_eq!(Preset::detect("my_cv", "CV", ""), Preset::Resume);
        assert_eq!(Preset::detect("x", "Resume builder", ""), Preset::Resume);
        assert_eq!(Preset::detect("quick_notes", "Notes", ""), Preset::Notes);
        assert_eq!(Preset::detect("x", "y", "a cocktail list"), Preset::BarMenu);
        assert_eq!(Preset::detect("weather", "Weather", "forecast"), Preset::Generic);
        // invoice wins over notes
        assert_eq!(Preset::detect("invoice_notes", "Invoice notes", ""), Preset::Invoice);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(Preset::detect("x", "DRINKS", ""), Preset::BarMenu);
    }

    #[test]
    fn every_template_renders_without_leftover_placeholders() {
        let k = key("sample_tool");
        for preset in Preset::ALL {
            let scaffold = render_preset(preset, &k, "Sample Tool", "Does things").unwrap();
            assert!(!scaffold.source.contains("{{label"), "{preset}");
            assert!(!scaffold.source.contains("{{key"), "{preset}");
            assert!(!scaffold.source.contains("{{description"), "{preset}");
            assert!(scaffold.source.contains("Sample Tool"), "{preset}");
            assert!(scaffold.source.contains("def render"), "{preset}");
            assert_eq!(scaffold.file_name, "sample_tool.py");
        }
    }

    #[test]
    fn generic_uses_default_description_and_form_id() {
        let scaffold = render(&key("weather"), "Weather", "  ").unwrap();
        assert_eq!(scaffold.preset, Preset::Generic);
        assert!(scaffold.source.contains(DEFAULT_DESCRIPTION));
        assert!(scaffold.source.contains("\"weather_form\""));
    }

    #[test]
    fn label_is_escaped_in_fstring_context() {
        let scaffold = render(&key("weather"), "W {os.getcwd()} \"x\"", "").unwrap();
        assert!(scaffold.source.contains("{{os.getcwd()}}"));
        assert!(!scaffold.source.contains("\"x\""));
        assert!(scaffold.source.contains("\\\"x\\\""));
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.as_str().parse::<Preset>().unwrap(), preset);
        }
        assert!("spreadsheet".parse::<Preset>().is_err());
    }

    #[test]
    fn path_joins_tools_dir() {
        let scaffold = render(&key("notes"), "Notes", "").unwrap();
        assert_eq!(scaffold.path_in("streamlit_app/tools/"), "streamlit_app/tools/notes.py");
        assert_eq!(scaffold.path_in(""), "notes.py");
    }
}
