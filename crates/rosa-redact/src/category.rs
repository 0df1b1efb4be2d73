//! Categories of sensitive content.

use serde::{Deserialize, Serialize};

/// Kind of sensitive content a rule masks.
///
/// Each category maps to one or more rules because the surrounding syntax
/// differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretCategory {
    /// JSON string field with a sensitive key, plain or once-escaped.
    JsonField,
    /// PEM certificate body between BEGIN/END markers.
    Certificate,
    /// Value of a sensitive command line flag.
    CliFlag,
    /// Credentials in a `--users name:secret` list.
    UserList,
    /// 12-digit AWS account id.
    AwsAccount,
}

impl SecretCategory {
    /// All categories, in registry order.
    pub const ALL: [SecretCategory; 5] = [
        SecretCategory::JsonField,
        SecretCategory::Certificate,
        SecretCategory::CliFlag,
        SecretCategory::UserList,
        SecretCategory::AwsAccount,
    ];

    /// Parse a category from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json_field" => Some(SecretCategory::JsonField),
            "certificate" => Some(SecretCategory::Certificate),
            "cli_flag" => Some(SecretCategory::CliFlag),
            "user_list" => Some(SecretCategory::UserList),
            "aws_account" => Some(SecretCategory::AwsAccount),
            _ => None,
        }
    }

    /// Whether matches of this category may span several lines.
    pub fn is_multiline(&self) -> bool {
        matches!(self, SecretCategory::Certificate)
    }
}

impl std::fmt::Display for SecretCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SecretCategory::JsonField => "json_field",
            SecretCategory::Certificate => "certificate",
            SecretCategory::CliFlag => "cli_flag",
            SecretCategory::UserList => "user_list",
            SecretCategory::AwsAccount => "aws_account",
        };
        write!(f, "{}", s)
    }
}
