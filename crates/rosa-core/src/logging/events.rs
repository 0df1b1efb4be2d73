//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! All events include the run ID and stage; messages and string fields are
//! sanitized when the event is built.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rosa_redact::{sanitize, Sanitized};
use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Unrecoverable; the caller aborts after logging.
    Fatal,
}

impl Level {
    /// Upper-case name used in text log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            _ => Level::Error,
        }
    }
}

/// Processing stages of a harness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Redacting files or stdin.
    Redact,
    /// Scanning input for secrets.
    Check,
    /// Running and capturing a command.
    Exec,
    /// Messages from the harness logger.
    Harness,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Redact => "redact",
            Stage::Check => "check",
            Stage::Exec => "exec",
            Stage::Harness => "harness",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Redact stage
    pub const REDACT_INPUT: &str = "redact.input";
    pub const REDACT_FINISHED: &str = "redact.finished";

    // Check stage
    pub const CHECK_SECRET_FOUND: &str = "check.secret_found";
    pub const CHECK_FINISHED: &str = "check.finished";

    // Exec stage
    pub const EXEC_STARTED: &str = "exec.started";
    pub const EXEC_FINISHED: &str = "exec.finished";

    // Harness logger
    pub const HARNESS_LOG: &str = "harness.log";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// Timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// Log level.
    pub level: Level,

    /// Event name (e.g., "run.started", "exec.finished").
    pub event: String,

    /// Unique ID for this invocation.
    pub run_id: String,

    /// Test case the event belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case: Option<Sanitized>,

    /// Current processing stage.
    pub stage: Stage,

    /// Human-readable message.
    pub message: Sanitized,

    /// Additional structured fields. String values are sanitized.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEvent {
    /// Create a new log event with required fields.
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        stage: Stage,
        message: Sanitized,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            test_case: None,
            stage,
            message,
            fields: HashMap::new(),
        }
    }

    /// Set the test case. The name is sanitized.
    pub fn with_test_case(mut self, test_case: &str) -> Self {
        self.test_case = Some(sanitize(test_case));
        self
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), sanitize_value(v));
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Sanitize every string inside a JSON value.
pub fn sanitize_value(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::String(s) => Value::String(sanitize(&s).into_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Context for generating log events with a consistent run ID.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Test case currently running, sanitized.
    pub test_case: Option<Sanitized>,
}

impl LogContext {
    /// Create a new log context.
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            test_case: None,
        }
    }

    /// Set the test case. The name is sanitized.
    pub fn with_test_case(mut self, test_case: &str) -> Self {
        self.test_case = Some(sanitize(test_case));
        self
    }

    /// Create an event with this context from an already sanitized message.
    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: &Sanitized,
    ) -> LogEvent {
        let mut e = LogEvent::new(level, event, &self.run_id, stage, message.clone());
        e.test_case.clone_from(&self.test_case);
        e
    }
}
