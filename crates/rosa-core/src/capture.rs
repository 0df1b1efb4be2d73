//! Run a command and capture its output, sanitized.
//!
//! Raw output never leaves this module: stdout and stderr are redacted
//! before they are stored in [`CapturedOutput`], and the command line is
//! only ever rendered through [`CommandCapture::display_command`].

use std::path::PathBuf;
use std::process::Command;

use rosa_redact::{sanitize, Sanitized};

use crate::error::{HarnessError, Result};

/// A command to run, with its arguments.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

/// Output of a finished command.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Sanitized standard output.
    pub stdout: Sanitized,
    /// Sanitized standard error.
    pub stderr: Sanitized,
}

impl CapturedOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl CommandCapture {
    /// Create a capture for `program` with `args`.
    pub fn new<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        CommandCapture {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command line, shell-quoted and sanitized, for log messages.
    pub fn display_command(&self) -> Sanitized {
        let line = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ");
        sanitize(&line)
    }

    /// Run the command to completion and capture its output.
    pub fn run(&self) -> Result<CapturedOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        tracing::debug!(command = %self.display_command(), "running command");

        let output = cmd.output().map_err(|source| HarnessError::Spawn {
            program: sanitize(&self.program),
            source,
        })?;

        let captured = CapturedOutput {
            status: output.status.code(),
            stdout: sanitize(&String::from_utf8_lossy(&output.stdout)),
            stderr: sanitize(&String::from_utf8_lossy(&output.stderr)),
        };

        tracing::debug!(
            status = ?captured.status,
            stdout_bytes = captured.stdout.as_str().len(),
            stderr_bytes = captured.stderr.as_str().len(),
            "command finished"
        );

        Ok(captured)
    }
}

/// Quote `arg` for display when it is empty or contains shell-special
/// characters.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
