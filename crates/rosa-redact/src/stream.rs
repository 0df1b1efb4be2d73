//! Line-oriented redaction for streams.
//!
//! Output is released a line at a time, except while a certificate block
//! is open or a line ends in a dangling secret prefix (`--password`,
//! `AWS Account:` ...). Those lines are held back until the match can be
//! seen whole, so a multi-line secret is never split across two
//! redaction calls.

use std::io::{self, Write};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::{
    JSON_BODY, JSON_ESCAPED_BODY, SENSITIVE_FLAGS, SENSITIVE_JSON_KEYS, USERS_FLAG,
};
use crate::{Redactor, Sanitized};

/// Opening PEM marker.
pub const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
/// Closing PEM marker.
pub const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// Held text is released regardless of open blocks past this size.
pub const DEFAULT_MAX_PENDING: usize = 1 << 20;

// A secret prefix at the very end of the held text; its value may be on the next line.
static DANGLING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let flags = SENSITIVE_FLAGS
        .iter()
        .chain(std::iter::once(&USERS_FLAG))
        .map(|f| regex::escape(f))
        .collect::<Vec<_>>()
        .join("|");
    let keys = SENSITIVE_JSON_KEYS
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    // flag or label awaiting its value, a JSON key awaiting its string, or
    // a JSON string still open at the end of the text
    let pattern = format!(
        r#"(?:--(?:{flags})|AWS (?:Billing )?Account:|\\?"(?:{keys})\\?"\s*:?|"(?:{keys})"\s*:\s*"{JSON_BODY}\\?|\\"(?:{keys})\\"\s*:\s*\\"{JSON_ESCAPED_BODY}\\*)\s*$"#
    );
    match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => panic!("dangling prefix pattern failed to compile: {err}"),
    }
});

/// Whether `text` opens a certificate block it does not close.
pub fn has_open_certificate(text: &str) -> bool {
    match (text.rfind(BEGIN_CERTIFICATE), text.rfind(END_CERTIFICATE)) {
        (Some(begin), Some(end)) => begin > end,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Whether `text` ends in a secret prefix whose value has not arrived yet.
pub fn has_dangling_prefix(text: &str) -> bool {
    DANGLING_PREFIX.is_match(text)
}

/// Accumulates lines and releases them once they can be redacted safely.
#[derive(Debug, Clone)]
pub struct StreamRedactor<'r> {
    redactor: Redactor<'r>,
    pending: String,
    max_pending: usize,
}

impl<'r> StreamRedactor<'r> {
    /// Create a stream over `redactor`.
    pub fn new(redactor: Redactor<'r>) -> Self {
        Self {
            redactor,
            pending: String::new(),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }

    /// Cap the amount of text held back waiting for a block to close.
    pub fn with_max_pending(mut self, bytes: usize) -> Self {
        self.max_pending = bytes;
        self
    }

    /// Feed one line (including its line terminator, if any).
    ///
    /// Returns the sanitized text that is ready to be written, or `None`
    /// while the line is being held.
    pub fn push_line(&mut self, line: &str) -> Option<Sanitized> {
        self.pending.push_str(line);
        if self.pending.len() < self.max_pending && self.must_hold() {
            return None;
        }
        Some(self.release())
    }

    /// Release everything still held.
    pub fn finish(&mut self) -> Option<Sanitized> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.release())
    }

    /// Whether text is currently being held back.
    pub fn is_holding(&self) -> bool {
        !self.pending.is_empty()
    }

    fn must_hold(&self) -> bool {
        has_open_certificate(&self.pending) || has_dangling_prefix(&self.pending)
    }

    fn release(&mut self) -> Sanitized {
        let text = std::mem::take(&mut self.pending);
        self.redactor.sanitize(&text)
    }
}

/// A [`Write`] adapter that redacts everything written through it.
///
/// Bytes are buffered until a full line is available. Invalid UTF-8 is
/// decoded lossily instead of being passed through raw. Held text is
/// released by [`RedactingWriter::finish`] or when the writer is dropped;
/// `flush` only forwards what is already safe to write.
///
/// `write` accepts its input once it is buffered. A failure of the inner
/// writer while releasing lines is reported by the next call instead.
pub struct RedactingWriter<'r, W: Write> {
    inner: W,
    buffer: Vec<u8>,
    stream: StreamRedactor<'r>,
    deferred: Option<io::Error>,
}

impl<W: Write> RedactingWriter<'static, W> {
    /// Wrap `inner` with the built-in registry.
    pub fn new(inner: W) -> Self {
        Self::with_redactor(inner, Redactor::global())
    }
}

impl<'r, W: Write> RedactingWriter<'r, W> {
    /// Wrap `inner` with a specific redactor.
    pub fn with_redactor(inner: W, redactor: Redactor<'r>) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            stream: StreamRedactor::new(redactor),
            deferred: None,
        }
    }

    /// Cap the amount of text held back waiting for a block to close.
    pub fn with_max_pending(mut self, bytes: usize) -> Self {
        self.stream.max_pending = bytes;
        self
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Write a line and its terminator.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_all(line.as_bytes())?;
        self.write_all(b"\n")
    }

    /// Redact and write everything still buffered or held, then flush.
    ///
    /// Safe to call more than once.
    pub fn finish(&mut self) -> io::Result<()> {
        self.take_deferred()?;
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest);
            if let Some(out) = self.stream.push_line(&rest) {
                self.inner.write_all(out.as_str().as_bytes())?;
            }
        }
        if let Some(out) = self.stream.finish() {
            self.inner.write_all(out.as_str().as_bytes())?;
        }
        self.inner.flush()
    }

    fn take_deferred(&mut self) -> io::Result<()> {
        match self.deferred.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn drain_lines(&mut self) -> io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(out) = self.stream.push_line(&line) {
                self.inner.write_all(out.as_str().as_bytes())?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Write for RedactingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.take_deferred()?;
        self.buffer.extend_from_slice(buf);
        if let Err(err) = self.drain_lines() {
            self.deferred = Some(err);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.take_deferred()?;
        self.drain_lines()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactingWriter<'_, W> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
