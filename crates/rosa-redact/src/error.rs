//! Error types for the redaction engine.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while building redaction rules.
///
/// Applying rules never fails; these only surface while a registry is
/// being constructed, and a registry that fails to build must abort the
/// host rather than run with a rule missing.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// Failed to compile a regex pattern.
    #[error("pattern error in rule '{rule}': {source}")]
    PatternError {
        /// Name of the offending rule.
        rule: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The pattern does not expose the prefix/value/suffix groups.
    #[error("rule '{rule}' must have exactly 3 capture groups, found {found}")]
    GroupMismatch {
        /// Name of the offending rule.
        rule: String,
        /// Number of explicit capture groups in the pattern.
        found: usize,
    },

    /// Two rules share a name.
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),
}

impl RedactionError {
    /// Name of the rule that produced this error.
    pub fn rule_name(&self) -> &str {
        match self {
            RedactionError::PatternError { rule, .. }
            | RedactionError::GroupMismatch { rule, .. }
            | RedactionError::DuplicateRule(rule) => rule,
        }
    }
}
