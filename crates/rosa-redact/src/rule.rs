//! A single redaction rule: a three-group pattern and its mask.

use std::borrow::Cow;

use regex::{Captures, Regex};

use crate::{RedactionError, Result, SecretCategory};

/// Mask literal substituted for every sensitive value.
///
/// Made only of `*` so that no rule can mistake it for a secret-bearing
/// prefix, suffix or account id.
pub const REDACT_VALUE: &str = "*************";

/// Number of capture groups a rule pattern must declare (prefix, value, suffix).
const RULE_GROUPS: usize = 3;

/// Pattern/replacement pair for one kind of sensitive text.
///
/// The matcher exposes exactly three capture groups. Group 1 (prefix) and
/// group 3 (suffix) are copied through verbatim; group 2 is replaced with
/// the rule's mask.
#[derive(Debug, Clone)]
pub struct RedactionRule {
    name: String,
    category: SecretCategory,
    matcher: Regex,
    replacement: String,
}

impl RedactionRule {
    /// Compile a rule masking with [`REDACT_VALUE`].
    pub fn new(
        name: impl Into<String>,
        category: SecretCategory,
        pattern: &str,
    ) -> Result<Self> {
        let name = name.into();
        let matcher = Regex::new(pattern).map_err(|source| RedactionError::PatternError {
            rule: name.clone(),
            source,
        })?;

        // captures_len counts the implicit whole-match group
        let found = matcher.captures_len() - 1;
        if found != RULE_GROUPS {
            return Err(RedactionError::GroupMismatch { rule: name, found });
        }

        Ok(Self {
            name,
            category,
            matcher,
            replacement: REDACT_VALUE.to_string(),
        })
    }

    /// Use a different mask literal.
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    /// Stable rule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category of content this rule masks.
    pub fn category(&self) -> SecretCategory {
        self.category
    }

    /// Source of the compiled pattern.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Mask literal.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every non-overlapping sensitive value in `text`.
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.matcher.replace_all(text, |caps: &Captures<'_>| {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let suffix = caps.get(3).map_or("", |m| m.as_str());
            let mut out =
                String::with_capacity(prefix.len() + self.replacement.len() + suffix.len());
            out.push_str(prefix);
            out.push_str(&self.replacement);
            out.push_str(suffix);
            out
        })
    }

    /// Whether the pattern occurs in `text` at all, masked or not.
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Number of matches whose value is not already the mask.
    pub fn count(&self, text: &str) -> usize {
        self.matcher
            .captures_iter(text)
            .filter(|caps| {
                caps.get(2)
                    .is_some_and(|value| value.as_str() != self.replacement)
            })
            .count()
    }
}
