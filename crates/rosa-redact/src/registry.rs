//! Ordered table of built-in redaction rules.
//!
//! The registry is built once and never mutated afterwards. Rules run in
//! declaration order, each one over the output of the previous rule.

use once_cell::sync::Lazy;

use crate::{RedactionError, RedactionRule, Result, SecretCategory};

/// JSON keys whose string values are always masked.
pub const SENSITIVE_JSON_KEYS: &[&str] = &["password", "additional_trust_bundle"];

/// Command line flags whose values are always masked, in registry order.
///
/// `--users` sits between `--client-secret` and `--cluster-admin-password`
/// but has its own syntax; see [`USERS_FLAG`].
pub const SENSITIVE_FLAGS: &[&str] = &[
    "password",
    "client-id",
    "bind-password",
    "client-secret",
    "cluster-admin-password",
    "billing-account",
];

/// Flag taking a `name:secret` list.
pub const USERS_FLAG: &str = "users";

/// Plain JSON string body: anything up to the first unescaped quote.
pub(crate) const JSON_BODY: &str = r#"(?:[^"\\]|\\.)*"#;

/// Body of a JSON string that was itself JSON-encoded once. Ends at the
/// first `\"` that is not part of an inner escape sequence.
pub(crate) const JSON_ESCAPED_BODY: &str = r#"(?:[^"\\]|\\[^"\\]|\\\\(?:\\.|[^"\\]))*"#;

/// Line break before/after a PEM marker, raw or escaped.
const PEM_BREAK: &str = r"(?:\r?\n|(?:\\r)?\\n)";

/// Flag value: a shell word running up to the next unquoted whitespace or
/// backslash. Quoted segments may contain spaces.
const FLAG_VALUE: &str = r#"(?:"[^"\n]*"|'[^'\n]*'|[^\s\\])+"#;

static GLOBAL: Lazy<PatternRegistry> = Lazy::new(|| match PatternRegistry::builtin() {
    Ok(registry) => registry,
    Err(err) => panic!("built-in redaction rules failed to compile: {err}"),
});

/// Ordered, immutable collection of redaction rules.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    rules: Vec<RedactionRule>,
}

impl PatternRegistry {
    /// Registry with no rules. Redacting through it is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide built-in registry.
    ///
    /// # Panics
    ///
    /// Panics on first use if a built-in pattern fails to compile. Running
    /// with a rule silently dropped would leak secrets into logs.
    pub fn global() -> &'static PatternRegistry {
        &GLOBAL
    }

    /// Build the built-in rule table.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::empty();

        for key in SENSITIVE_JSON_KEYS {
            for rule in json_field_rules(key)? {
                registry = registry.with_rule(rule)?;
            }
        }

        registry = registry.with_rule(certificate_rule()?)?;

        for flag in SENSITIVE_FLAGS {
            registry = registry.with_rule(flag_rule(flag)?)?;
            if *flag == "client-secret" {
                registry = registry.with_rule(users_rule()?)?;
            }
        }

        for rule in aws_account_rules()? {
            registry = registry.with_rule(rule)?;
        }

        Ok(registry)
    }

    /// Append a rule. Names must be unique.
    pub fn with_rule(mut self, rule: RedactionRule) -> Result<Self> {
        if self.get(rule.name()).is_some() {
            return Err(RedactionError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Iterate rules in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, RedactionRule> {
        self.rules.iter()
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&RedactionRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules belonging to one category.
    pub fn by_category(
        &self,
        category: SecretCategory,
    ) -> impl Iterator<Item = &RedactionRule> + '_ {
        self.rules
            .iter()
            .filter(move |rule| rule.category() == category)
    }
}

impl<'a> IntoIterator for &'a PatternRegistry {
    type Item = &'a RedactionRule;
    type IntoIter = std::slice::Iter<'a, RedactionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn rule_name(kind: &str, key: &str) -> String {
    format!("{}-{}", kind, key.replace('_', "-"))
}

/// Plain and once-escaped variants of a sensitive JSON string field.
fn json_field_rules(key: &str) -> Result<[RedactionRule; 2]> {
    let key = regex::escape(key);
    let plain = RedactionRule::new(
        rule_name("json", &key),
        SecretCategory::JsonField,
        &format!(r#"(?s)("{key}"\s*:\s*")({JSON_BODY})(")"#),
    )?;
    let escaped = RedactionRule::new(
        format!("{}-escaped", rule_name("json", &key)),
        SecretCategory::JsonField,
        &format!(r#"(?s)(\\"{key}\\"\s*:\s*\\")({JSON_ESCAPED_BODY})(\\")"#),
    )?;
    Ok([plain, escaped])
}

fn certificate_rule() -> Result<RedactionRule> {
    RedactionRule::new(
        "certificate",
        SecretCategory::Certificate,
        &format!(
            r"(?s)(-----BEGIN CERTIFICATE-----{PEM_BREAK}?)(.*?)({PEM_BREAK}?-----END CERTIFICATE-----)"
        ),
    )
}

fn flag_rule(flag: &str) -> Result<RedactionRule> {
    let escaped = regex::escape(flag);
    RedactionRule::new(
        rule_name("flag", flag),
        SecretCategory::CliFlag,
        &format!(r"(--{escaped}(?:=|\s+))({FLAG_VALUE})([\s\\]*)"),
    )
}

fn users_rule() -> Result<RedactionRule> {
    RedactionRule::new(
        rule_name("flag", USERS_FLAG),
        SecretCategory::UserList,
        &format!(r#"(--{USERS_FLAG}(?:=|\s+)["']?[A-Za-z0-9._-]+:)([^\s\\]+)([\s\\]*)"#),
    )
}

fn aws_account_rules() -> Result<[RedactionRule; 3]> {
    Ok([
        RedactionRule::new(
            "arn-account",
            SecretCategory::AwsAccount,
            r"(arn:aws(?:-[a-z]+)*:[a-z0-9-]+:[a-z0-9-]*:)([0-9]{12})(:)",
        )?,
        RedactionRule::new(
            "aws-account-label",
            SecretCategory::AwsAccount,
            r"(AWS Account:\s*)([0-9]{12})(\b)",
        )?,
        RedactionRule::new(
            "aws-billing-account-label",
            SecretCategory::AwsAccount,
            r"(AWS Billing Account:\s*)([0-9]{12})(\b)",
        )?,
    ])
}
