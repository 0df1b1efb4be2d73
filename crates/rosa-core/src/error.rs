//! Error types for the harness.

use rosa_redact::Sanitized;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised by the harness logger, command capture and CLI.
///
/// Every message carried here is already sanitized; no variant holds raw
/// command output.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// I/O failure while reading input or writing a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The wrapped command could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program name, sanitized.
        program: Sanitized,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing a report failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fatal message was logged; the caller must abort.
    #[error("fatal: {0}")]
    Fatal(Sanitized),
}

impl HarnessError {
    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            HarnessError::Io(_) => ExitCode::IoError,
            HarnessError::Spawn { .. } => ExitCode::CommandFailed,
            HarnessError::Json(_) | HarnessError::Fatal(_) => ExitCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let io = HarnessError::Io(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), ExitCode::IoError);

        let spawn = HarnessError::Spawn {
            program: rosa_redact::sanitize("rosa"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.exit_code(), ExitCode::CommandFailed);
        assert!(spawn.to_string().starts_with("failed to run 'rosa'"));
    }

    #[test]
    fn test_fatal_message_is_sanitized() {
        let err = HarnessError::Fatal(rosa_redact::sanitize("login --password hunter2"));
        assert_eq!(err.to_string(), "fatal: login --password *************");
        assert_eq!(err.exit_code(), ExitCode::InternalError);
    }
}
