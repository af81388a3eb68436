//! Error types for source fetching.
//!
//! Errors are categorized so the caller can tell a bad locator (fix the
//! declaration) from a flaky network (try again).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of fetch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// Locator is malformed or uses a scheme nobody handles.
    Locator,
    /// Downloaded file couldn't be unpacked.
    Format,
    /// An external tool (git, curl) failed.
    Tool,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Locator => "Unusable source locator",
            Self::Format => "Invalid archive",
            Self::Tool => "External tool failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Locator => "Use an http://, https://, ftp:// or git:// source instead",
            Self::Format => "The downloaded file may be corrupted; remove it from the download dir and retry",
            Self::Tool => "Check that the tool is installed and the source is reachable",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while fetching sources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Locator couldn't be parsed.
    #[error("invalid source '{locator}': {message}")]
    InvalidLocator {
        /// Raw locator text.
        locator: String,
        /// Parse error.
        message: String,
    },

    /// No strategy registered for the locator's scheme.
    #[error("can't handle {scheme}:// URLs yet ({locator})")]
    UnsupportedScheme {
        /// Scheme that has no strategy.
        scheme: String,
        /// Raw locator text.
        locator: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Download didn't complete.
    #[error("download failed for {url}: {message}")]
    DownloadFailed {
        /// Source being downloaded.
        url: String,
        /// Error message.
        message: String,
    },

    /// File type has no known extractor.
    #[error("don't know how to extract {0}")]
    UnknownArchive(String),

    /// Archive couldn't be unpacked.
    #[error("extraction failed for {archive}: {message}")]
    ExtractionFailed {
        /// Archive path.
        archive: PathBuf,
        /// Error message.
        message: String,
    },

    /// External command failed or couldn't run.
    #[error("{command} failed: {message}")]
    CommandFailed {
        /// Command line.
        command: String,
        /// Failure details.
        message: String,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidLocator { .. } | Error::UnsupportedScheme { .. } => ErrorCategory::Locator,
            Error::HttpError { .. } | Error::DownloadFailed { .. } => ErrorCategory::Network,
            Error::UnknownArchive(_) | Error::ExtractionFailed { .. } => ErrorCategory::Format,
            Error::CommandFailed { .. } => ErrorCategory::Tool,
            Error::Io { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<depkit::Error> for Error {
    fn from(err: depkit::Error) -> Self {
        match err {
            depkit::Error::CommandFailed { command, message } => {
                Self::CommandFailed { command, message }
            }
            other => Self::CommandFailed {
                command: String::from("command"),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_scheme_message() {
        let err = Error::UnsupportedScheme {
            scheme: "xmpp".to_string(),
            locator: "xmpp://chat.example.com".to_string(),
        };
        assert!(err.to_string().starts_with("can't handle xmpp:// URLs yet"));
        assert_eq!(err.category(), ErrorCategory::Locator);
        assert!(err.category().advice().contains("git://"));
    }

    #[test]
    fn test_http_error_category() {
        let err = Error::HttpError {
            message: "HTTP 503".to_string(),
            status: Some(503),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_depkit_command_failure() {
        let err: Error = depkit::Error::CommandFailed {
            command: "git clone".to_string(),
            message: "repository not found".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Tool);
        assert!(err.to_string().contains("repository not found"));
    }

    #[test]
    fn test_error_category_display() {
        assert!(format!("{}", ErrorCategory::Network).contains("Network"));
    }
}
