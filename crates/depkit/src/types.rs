//! Core types shared by the convergence checks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Output;

/// Options for a single process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run as this user (via sudo) instead of the current one
    pub as_user: Option<String>,
    /// A non-zero exit is an expected outcome, not an error
    pub failable: bool,
    /// Hint that the caller wants progress shown while this runs
    pub spinner: bool,
    /// Data piped to the command's stdin
    pub input: Option<String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a probe whose failure is a normal answer
    pub fn failable() -> Self {
        Self {
            failable: true,
            ..Self::default()
        }
    }

    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.as_user = Some(user.into());
        self
    }

    pub fn spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Output from an executed command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Successful output with the given stdout (handy for mocks)
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into().into_bytes(),
            stderr: Vec::new(),
            success: true,
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
            success: false,
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Where a dependency was declared, for error messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A group of commands that all resolve to the same directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Located {
    pub commands: Vec<String>,
    pub dir: PathBuf,
}

/// Outcome of checking that a set of commands is installed from one place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandLocation {
    /// Every command resolved, all from one location
    InPath { location: Located, ours: bool },
    /// Some commands did not resolve at all
    Missing { missing: Vec<String> },
    /// Commands resolved from more than one place: ours and somewhere else,
    /// or several places none of which are ours. Groups are in first-seen
    /// order, with our own group first.
    Conflicting { locations: Vec<Located> },
}

impl CommandLocation {
    /// Whether the check is met
    pub fn is_met(&self) -> bool {
        matches!(self, Self::InPath { .. })
    }

    /// Whether the commands came from more than one place
    pub fn is_conflicting(&self) -> bool {
        matches!(self, Self::Conflicting { .. })
    }
}
