//! # patchkit
//!
//! Idempotent, attributable edits to configuration files.
//!
//! Every edit is safe to run again: a [`Patcher`] looks for its own earlier
//! work before touching a file, and leaves a marker comment naming the tool,
//! version and time of each change.
//!
//! ## Example
//!
//! ```ignore
//! use patchkit::{DirectWriter, InsertOptions, Patcher, Stamp};
//!
//! let patcher = Patcher::new(DirectWriter, Stamp::new("provision", "0.1.0"));
//! patcher.append_to_file("export PATH=/opt/bin:$PATH", "~/.profile".as_ref())?;
//! patcher.insert_into_file("# END", "/etc/hosts".as_ref(), "10.0.0.1 db", &InsertOptions::default())?;
//! ```
//!
//! Writes go through a [`PrivilegedWriter`], so files the current user
//! can't write are written as their owner, and dry-runs can capture the
//! result with a [`RecordingWriter`] instead.

pub mod error;
pub mod marker;
pub mod patcher;
pub mod writer;

pub use error::{Error, ErrorCategory, Result};
pub use marker::Stamp;
pub use patcher::{ConfigStatus, InsertOptions, PatchOutcome, Patcher, Pattern, grep};
pub use writer::{DirectWriter, FileOwner, PrivilegedWriter, RecordedWrite, RecordingWriter, WriteMode, is_writable};
