//! Error types for convergence decisions.
//!
//! Declaration mistakes (bad choice names, ambiguous behavior) are
//! programmer errors and surface immediately. Environment conditions such as
//! missing commands are not errors at all; they are reported through
//! [`CommandLocation`](crate::CommandLocation).

use thiserror::Error;

/// Result type alias for depkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of depkit errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The dependency was declared incorrectly
    Declaration,
    /// An external command could not be run
    Execution,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Declaration => "Invalid dependency declaration",
            Self::Execution => "Command execution failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Declaration => "Fix the choice names used in the dependency definition",
            Self::Execution => "Check that the command exists and is runnable",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while deciding how to converge a dependency.
#[derive(Debug, Error)]
pub enum Error {
    /// `otherwise` was listed as a possible choice
    #[error("you can't use '{name}' as a choice name, because it's reserved")]
    InvalidChoiceName {
        /// The reserved name that was supplied
        name: String,
    },

    /// Both a value and a block were registered for one choice
    #[error("you can supply values or a block for '{choice}', but not both")]
    ConflictingBehavior {
        /// Choice that received both
        choice: String,
    },

    /// A choice outside the declared set was registered
    #[error("the choice '{choice}' isn't valid for {owner} (expected one of: {expected})")]
    UnknownChoice {
        /// The offending choice name
        choice: String,
        /// Dependency that declared the choice set
        owner: String,
        /// Comma-separated allowed names
        expected: String,
    },

    /// Command could not be spawned or failed unexpectedly
    #[error("command failed: {command}: {message}")]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Failure details
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidChoiceName { .. }
            | Self::ConflictingBehavior { .. }
            | Self::UnknownChoice { .. } => ErrorCategory::Declaration,
            Self::CommandFailed { .. } => ErrorCategory::Execution,
            Self::Io(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error comes from a bad declaration.
    pub fn is_declaration(&self) -> bool {
        self.category() == ErrorCategory::Declaration
    }
}
