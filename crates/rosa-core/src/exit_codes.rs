//! Exit codes for the rosa-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

/// Exit codes for rosa-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-9)
    // ========================================================================
    /// Success: no secrets found / command succeeded
    Clean = 0,

    /// Input contains at least one recognized secret
    SecretsFound = 1,

    /// Wrapped command could not be started
    CommandFailed = 3,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates operational outcome (codes 0-9).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::SecretsFound => "OK_SECRETS_FOUND",
            ExitCode::CommandFailed => "ERR_COMMAND",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
