//! Harness logger and the sinks it writes to.
//!
//! The [`Logger`] is what test code calls. It sanitizes each message once
//! and hands the result to a [`LogSink`]. Sinks only ever see
//! [`Sanitized`] text.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{SecondsFormat, Utc};
use rosa_redact::{Redactor, Sanitized};

use super::config::LogFormat;
use super::events::{event_names, Level, LogContext, Stage};
use crate::error::{HarnessError, Result};

/// Destination for sanitized log lines.
pub trait LogSink {
    /// Write one sanitized message at `level`.
    fn emit(&mut self, level: Level, line: &Sanitized) -> io::Result<()>;
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn emit(&mut self, level: Level, line: &Sanitized) -> io::Result<()> {
        (**self).emit(level, line)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn emit(&mut self, level: Level, line: &Sanitized) -> io::Result<()> {
        (**self).emit(level, line)
    }
}

/// Sink writing `<ts> <LEVEL> <message>` lines, or JSONL events, to a writer.
pub struct WriterSink<W: Write> {
    writer: W,
    format: LogFormat,
    timestamps: bool,
    context: LogContext,
}

impl<W: Write> WriterSink<W> {
    /// Human-readable lines with timestamps.
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer,
            format: LogFormat::Human,
            timestamps: true,
            context: LogContext::new(super::generate_run_id()),
        }
    }

    /// One JSON event per line, tagged with `context`.
    pub fn jsonl(writer: W, context: LogContext) -> Self {
        WriterSink {
            writer,
            format: LogFormat::Jsonl,
            timestamps: true,
            context,
        }
    }

    /// Enable or disable timestamps in human output.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LogSink for WriterSink<W> {
    fn emit(&mut self, level: Level, line: &Sanitized) -> io::Result<()> {
        match self.format {
            LogFormat::Human if self.timestamps => {
                let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                writeln!(self.writer, "{} {} {}", ts, level, line)
            }
            LogFormat::Human => writeln!(self.writer, "{} {}", level, line),
            LogFormat::Jsonl => {
                let event = self
                    .context
                    .event(level, event_names::HARNESS_LOG, Stage::Harness, line);
                writeln!(self.writer, "{}", event.to_jsonl())
            }
        }
    }
}

/// Sink forwarding messages to `tracing` events.
///
/// `FATAL` has no tracing equivalent and is emitted at error level with a
/// `fatal = true` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, level: Level, line: &Sanitized) -> io::Result<()> {
        let message = line.as_str();
        match level {
            Level::Trace => tracing::trace!(target: "harness.log", "{}", message),
            Level::Debug => tracing::debug!(target: "harness.log", "{}", message),
            Level::Info => tracing::info!(target: "harness.log", "{}", message),
            Level::Warn => tracing::warn!(target: "harness.log", "{}", message),
            Level::Error => tracing::error!(target: "harness.log", "{}", message),
            Level::Fatal => tracing::error!(target: "harness.log", fatal = true, "{}", message),
        }
        Ok(())
    }
}

/// Harness logger.
///
/// Messages below the minimum level are dropped before they are
/// formatted or redacted.
pub struct Logger<S: LogSink> {
    sink: S,
    min_level: Level,
    redactor: Redactor<'static>,
}

impl Logger<TracingSink> {
    /// Logger forwarding to the global tracing subscriber.
    pub fn tracing() -> Self {
        Logger::new(TracingSink)
    }
}

impl<S: LogSink> Logger<S> {
    /// Create a logger over `sink` that passes every level.
    pub fn new(sink: S) -> Self {
        Logger {
            sink,
            min_level: Level::Trace,
            redactor: Redactor::global(),
        }
    }

    /// Drop messages below `level`.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Use a specific redactor.
    pub fn with_redactor(mut self, redactor: Redactor<'static>) -> Self {
        self.redactor = redactor;
        self
    }

    /// Whether messages at `level` are emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the logger, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Sanitize and emit `message` at `level`.
    pub fn log(&mut self, level: Level, message: impl Display) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let line = self.redactor.sanitize(&message.to_string());
        self.sink.emit(level, &line)?;
        Ok(())
    }

    /// Log `message` at `Level::Debug`.
    pub fn debug(&mut self, message: impl Display) -> Result<()> {
        self.log(Level::Debug, message)
    }

    /// Log `message` at `Level::Info`.
    pub fn info(&mut self, message: impl Display) -> Result<()> {
        self.log(Level::Info, message)
    }

    /// Log `message` at `Level::Warn`.
    pub fn warn(&mut self, message: impl Display) -> Result<()> {
        self.log(Level::Warn, message)
    }

    /// Log `message` at `Level::Error`.
    pub fn error(&mut self, message: impl Display) -> Result<()> {
        self.log(Level::Error, message)
    }

    /// Emit `message` at `FATAL` and return the error the caller must abort with.
    ///
    /// Emitted regardless of the minimum level. A failed write does not
    /// change the result.
    pub fn fatal(&mut self, message: impl Display) -> HarnessError {
        let line = self.redactor.sanitize(&message.to_string());
        let _ = self.sink.emit(Level::Fatal, &line);
        HarnessError::Fatal(line)
    }
}
