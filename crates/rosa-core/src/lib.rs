//! Cluster Test Harness Core Library
//!
//! This library provides the pieces the harness uses around the redaction
//! engine:
//! - Exit codes for CLI operations
//! - Sanitized structured logging and the harness logger
//! - Command execution with sanitized output capture
//!
//! The binary entry point is in `main.rs`.

pub mod capture;
pub mod error;
pub mod exit_codes;
pub mod logging;

pub use capture::{CapturedOutput, CommandCapture};
pub use error::{HarnessError, Result};
pub use exit_codes::ExitCode;
