//! # fetchkit
//!
//! Source acquisition for provisioning.
//!
//! This crate provides functionality for:
//! - Parsing source locators into a scheme and address
//! - Declaring the external tools a set of sources needs (`git`)
//! - Fetching archives over http, https and ftp, with download reuse
//! - Unpacking `.tar.gz`, `.tar`, `.tar.zst` and `.zip` archives
//! - Cloning and updating git checkouts
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use fetchkit::{ArchiveStrategy, GitStrategy, SourceDispatcher, SourceSpec};
//!
//! let mut dispatcher = SourceDispatcher::standard(
//!     Rc::new(ArchiveStrategy::new(executor, "~/.cache/provision/downloads", "~/.cache/provision/build")),
//!     Rc::new(GitStrategy::new(executor, "~/.cache/provision/build")),
//! );
//!
//! dispatcher.setup_source_uris(&dep, &[SourceSpec::from("git://github.com/rbenv/rbenv.git")])?;
//! dispatcher.process_sources(&mut |line| println!("{line}"))?;
//! ```
//!
//! Schemes without a strategy are reported as unsupported rather than
//! silently skipped.

pub mod dispatch;
pub mod error;
pub mod locator;
pub mod strategy;

pub use dispatch::SourceDispatcher;
pub use error::{Error, ErrorCategory, Result};
pub use locator::{Scheme, SourceLocator, SourceSpec};
pub use strategy::{ArchiveStrategy, FetchStrategy, GitStrategy, MockStrategy};
