//! Main redaction engine.
//!
//! The [`Redactor`] applies every rule of a [`PatternRegistry`] in order,
//! each rule working on the output of the previous one. It is a pure
//! function of its input and the registry, so it can be shared freely
//! across threads.

use std::borrow::Cow;

use serde::Serialize;

use crate::{PatternRegistry, SecretCategory};

/// Text that has passed through a [`Redactor`].
///
/// Only the redactor can construct this type, so a sink that accepts
/// `&Sanitized` cannot receive raw output by accident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sanitized(String);

impl Sanitized {
    /// Borrow the sanitized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the sanitized text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Sanitized {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sanitized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Sanitized> for String {
    fn from(value: Sanitized) -> Self {
        value.0
    }
}

/// Matches of one rule during a redaction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    /// Rule name.
    pub rule: String,
    /// Category of the rule.
    pub category: SecretCategory,
    /// Number of values masked by the rule.
    pub count: usize,
}

/// Result of a redaction pass with per-rule statistics.
///
/// Never carries the original values, only counts.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionReport {
    /// The redacted output. Left out of serialized reports.
    #[serde(skip)]
    pub output: Sanitized,
    /// Rules that masked at least one value, in registry order.
    pub hits: Vec<RuleHit>,
    /// Whether the output differs from the input.
    pub was_modified: bool,
}

impl RedactionReport {
    /// Total number of masked values across all rules.
    pub fn total(&self) -> usize {
        self.hits.iter().map(|hit| hit.count).sum()
    }

    /// Masked values per category.
    pub fn count_for(&self, category: SecretCategory) -> usize {
        self.hits
            .iter()
            .filter(|hit| hit.category == category)
            .map(|hit| hit.count)
            .sum()
    }
}

/// Applies a registry's rules to text.
#[derive(Debug, Clone, Copy)]
pub struct Redactor<'r> {
    registry: &'r PatternRegistry,
}

impl Redactor<'static> {
    /// Redactor over the process-wide built-in registry.
    pub fn global() -> Self {
        Self::new(PatternRegistry::global())
    }
}

impl Default for Redactor<'static> {
    fn default() -> Self {
        Self::global()
    }
}

impl<'r> Redactor<'r> {
    /// Create a redactor over `registry`.
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self { registry }
    }

    /// The registry this redactor applies.
    pub fn registry(&self) -> &'r PatternRegistry {
        self.registry
    }

    /// Mask every sensitive value in `text`.
    ///
    /// Total over all inputs: text with no recognizable secret comes back
    /// unchanged.
    pub fn redact(&self, text: &str) -> String {
        self.registry.iter().fold(text.to_string(), |acc, rule| {
            // replace_all borrows when nothing matched
            let replaced = match rule.apply(&acc) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            replaced.unwrap_or(acc)
        })
    }

    /// Mask every sensitive value and mark the result as sanitized.
    pub fn sanitize(&self, text: &str) -> Sanitized {
        Sanitized(self.redact(text))
    }

    /// Mask every sensitive value and report which rules fired.
    pub fn redact_with_report(&self, text: &str) -> RedactionReport {
        let mut hits = Vec::new();
        let output = self.registry.iter().fold(text.to_string(), |acc, rule| {
            let count = rule.count(&acc);
            if count == 0 {
                return acc;
            }
            hits.push(RuleHit {
                rule: rule.name().to_string(),
                category: rule.category(),
                count,
            });
            rule.apply(&acc).into_owned()
        });

        RedactionReport {
            was_modified: output != text,
            output: Sanitized(output),
            hits,
        }
    }

    /// Whether redaction would change `text`.
    pub fn contains_secrets(&self, text: &str) -> bool {
        self.redact(text) != text
    }
}

/// Redact `text` with the built-in registry.
pub fn redact(text: &str) -> String {
    Redactor::global().redact(text)
}

/// Sanitize `text` with the built-in registry.
pub fn sanitize(text: &str) -> Sanitized {
    Redactor::global().sanitize(text)
}

/// Canary inputs paired with the secret each one carries.
///
/// The secret must never appear in the redacted output.
pub const CANARY_SECRETS: &[(&str, &str)] = &[
    (r#"{"password":"Canary-Pa55word!"}"#, "Canary-Pa55word!"),
    (r#"{\"password\":\"Canary-Esc4ped\"}"#, "Canary-Esc4ped"),
    (
        r#"{"additional_trust_bundle":"-----BEGIN CERTIFICATE-----\nQ2FuYXJ5QnVuZGxl\n-----END CERTIFICATE-----"}"#,
        "Q2FuYXJ5QnVuZGxl",
    ),
    (
        "-----BEGIN CERTIFICATE-----\nQ2FuYXJ5Q2VydA==\n-----END CERTIFICATE-----",
        "Q2FuYXJ5Q2VydA==",
    ),
    ("rosa login --client-secret canarySecret42", "canarySecret42"),
    ("rosa login --client-id canaryClientId", "canaryClientId"),
    (
        "rosa create idp --type ldap --bind-password canaryBind99",
        "canaryBind99",
    ),
    (
        "rosa create admin --cluster-admin-password canaryAdminPw",
        "canaryAdminPw",
    ),
    (
        "rosa create cluster --billing-account 998877665544",
        "998877665544",
    ),
    (
        "rosa create idp --type htpasswd --users canary:canaryUserPw",
        "canaryUserPw",
    ),
    (
        "Role ARN: arn:aws:iam::112233445566:role/ManagedOpenShift-Installer-Role",
        "112233445566",
    ),
    ("AWS Account:                 665544332211\n", "665544332211"),
    ("AWS Billing Account:         121212343434\n", "121212343434"),
];
