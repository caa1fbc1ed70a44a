//! Error types for scaffold rendering

/// Template rendering errors
///
/// Templates are compiled in, so any of these is a defect in a template
/// resource rather than in user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScaffoldError {
    /// `{{` without a closing `}}`
    #[error("unterminated placeholder in template '{template}' at byte {offset}")]
    Unterminated {
        template: &'static str,
        offset: usize,
    },

    /// Placeholder name has no value
    #[error("unknown placeholder '{name}' in template '{template}'")]
    UnknownPlaceholder {
        template: &'static str,
        name: String,
    },

    /// Filter is not recognised
    #[error("unknown filter '{filter}' in template '{template}'")]
    UnknownFilter {
        template: &'static str,
        filter: String,
    },
}
