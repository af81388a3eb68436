//! Error types for file patching.
//!
//! A failed patch always leaves the target file untouched: every check
//! happens before the single write at the end.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for patchkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of patch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The spot to patch doesn't exist in the file
    NotFound,
    /// Writing needs privileges we don't have
    Permission,
    /// The write itself failed
    Write,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Patch location not found",
            Self::Permission => "Permission denied",
            Self::Write => "Write failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the file contents; it may have been edited by hand",
            Self::Permission => "Enable sudo in the config or fix the file's permissions",
            Self::Write => "Check free disk space and the file's permissions",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while patching a file.
#[derive(Debug, Error)]
pub enum Error {
    /// No line equal to the anchor
    #[error("couldn't find the spot to write to in {path}: no line '{anchor}'")]
    AnchorNotFound {
        /// File being patched
        path: PathBuf,
        /// Anchor line that was searched for
        anchor: String,
    },

    /// The line before the anchor isn't the expected one
    #[error("couldn't find the spot to write to in {path}: expected '{expected}' before the anchor, found '{found}'")]
    AnchorMismatch {
        /// File being patched
        path: PathBuf,
        /// Line that should precede the anchor
        expected: String,
        /// Line that actually precedes it
        found: String,
    },

    /// No line to change, and no record of having changed one
    #[error("no line starting with '{line}' in {path}")]
    LineNotFound {
        /// File being patched
        path: PathBuf,
        /// Line prefix that was searched for
        line: String,
    },

    /// Target file doesn't exist
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// File isn't writable and the writer can't elevate
    #[error("{path} isn't writable and elevated writes are unavailable")]
    ElevationUnavailable {
        /// File being patched
        path: PathBuf,
    },

    /// The privileged writer failed
    #[error("couldn't write {path}: {message}")]
    WriteFailed {
        /// File being patched
        path: PathBuf,
        /// Failure details
        message: String,
    },

    /// Append text with no non-blank line
    #[error("nothing to append to {path}: the text is blank")]
    EmptyText {
        /// File being patched
        path: PathBuf,
    },

    /// Bad regular expression
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// IO error during file operations
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AnchorNotFound { .. }
            | Self::AnchorMismatch { .. }
            | Self::LineNotFound { .. }
            | Self::FileNotFound(_) => ErrorCategory::NotFound,
            Self::ElevationUnavailable { .. } => ErrorCategory::Permission,
            Self::WriteFailed { .. } => ErrorCategory::Write,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorCategory::Permission
            }
            Self::EmptyText { .. } | Self::InvalidPattern(_) | Self::Io { .. } => ErrorCategory::Other,
        }
    }

    /// Wrap an IO error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_not_found_becomes_file_not_found() {
        let err = Error::io("/etc/nope", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, Error::FileNotFound(_)));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_permission_denied_category() {
        let err = Error::io(
            "/etc/hosts",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_anchor_messages_name_the_file() {
        let err = Error::AnchorNotFound {
            path: "/etc/nginx.conf".into(),
            anchor: "FOO".into(),
        };
        assert!(err.to_string().contains("/etc/nginx.conf"));
        assert!(err.to_string().contains("'FOO'"));
    }
}
