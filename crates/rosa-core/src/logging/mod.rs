//! Structured, sanitized logging for the harness.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for CI artifacts
//!
//! Both modes pass every message and string field through the redactor,
//! so nothing that reaches stderr carries a recognized secret.
//!
//! # Usage
//!
//! ```ignore
//! use rosa_core::logging::{init_logging, LogConfig, Logger};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let mut logger = Logger::tracing();
//! logger.info(format_args!("Creating nodepool with flags {:?}", flags))?;
//! ```
//!
//! # Design Notes
//!
//! - stdout is reserved for command payloads
//! - stderr receives all log output (human or JSONL)

pub mod config;
pub mod events;
pub mod layer;
pub mod sink;
pub mod writer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;
pub use sink::{LogSink, Logger, TracingSink, WriterSink};
pub use writer::RedactingMakeWriter;

use std::io::IsTerminal;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
/// `RUST_LOG` directives, when set, replace the configured level.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .from_env_lossy();

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(RedactingMakeWriter::stderr())
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonlLayer::stderr())
                .init();
        }
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // Shorten to first 12 hex chars for readability
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Convenience macro for structured event logging with context.
///
/// Usage:
/// ```ignore
/// log_event!(ctx, INFO, event_names::EXEC_STARTED, Stage::Exec, "Running command");
/// log_event!(ctx, DEBUG, event_names::REDACT_FINISHED, Stage::Redact, "done",
///     masked = 3);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}
