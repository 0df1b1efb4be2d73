//! Redaction engine for cluster CLI output and test harness logs.
//!
//! Every piece of text the harness prints, logs or captures from the CLI
//! passes through a [`Redactor`] first. The redactor applies an ordered
//! list of rules; each rule finds one kind of sensitive value and replaces
//! it with [`REDACT_VALUE`] while leaving the surrounding syntax intact.
//!
//! # Key Features
//!
//! - **Progressive rules**: each rule runs on the output of the previous
//!   one, so a JSON trust bundle is masked whole before the certificate
//!   rule ever sees it.
//! - **Structure preserving**: flag names, JSON keys, ARN prefixes and
//!   line continuations survive redaction.
//! - **Idempotent**: redacting already-redacted text is a no-op.
//! - **Sanitized output type**: sinks that accept [`Sanitized`] cannot be
//!   handed raw text.
//! - **Streaming**: [`RedactingWriter`] redacts line by line without
//!   splitting certificate blocks.
//!
//! # Example
//!
//! ```
//! use rosa_redact::redact;
//!
//! let line = redact("rosa login --client-secret abcdef123 --client-id myid");
//! assert_eq!(
//!     line,
//!     "rosa login --client-secret ************* --client-id *************"
//! );
//! ```

pub mod category;
pub mod engine;
pub mod error;
pub mod registry;
pub mod rule;
pub mod stream;

pub use category::SecretCategory;
pub use engine::{
    redact, sanitize, RedactionReport, Redactor, RuleHit, Sanitized, CANARY_SECRETS,
};
pub use error::{RedactionError, Result};
pub use registry::{PatternRegistry, SENSITIVE_FLAGS, SENSITIVE_JSON_KEYS, USERS_FLAG};
pub use rule::{RedactionRule, REDACT_VALUE};
pub use stream::{RedactingWriter, StreamRedactor};
