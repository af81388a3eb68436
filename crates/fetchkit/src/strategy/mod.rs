//! Fetch strategies
//!
//! A strategy knows how to bring one kind of source onto disk. The
//! dispatcher owns a table from scheme to strategy and never fetches
//! anything itself.
//!
//! # Testing
//!
//! Use [`MockStrategy`] for testing without network access:
//!
//! ```
//! use fetchkit::strategy::{FetchStrategy, MockStrategy};
//! use fetchkit::SourceLocator;
//!
//! let mock = MockStrategy::new("archive");
//! let loc = SourceLocator::parse("http://example.com/a.tgz").unwrap();
//! mock.fetch(&loc, &mut |_| {}).unwrap();
//! assert_eq!(mock.calls(), vec!["http://example.com/a.tgz".to_string()]);
//! ```

pub mod archive;
pub mod git;

use crate::error::{Error, Result};
use crate::locator::SourceLocator;
use std::cell::RefCell;

pub use archive::ArchiveStrategy;
pub use git::GitStrategy;

/// Brings a source onto disk
pub trait FetchStrategy {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Fetch `locator`, passing each line of progress output to `on_line`.
    fn fetch(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<()>;
}

/// Strategy that records what it was asked to fetch
#[derive(Debug, Default)]
pub struct MockStrategy {
    name: String,
    calls: RefCell<Vec<String>>,
    failing: Vec<String>,
}

impl MockStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Make fetches of `locator` fail
    pub fn failing_on(mut self, locator: impl Into<String>) -> Self {
        self.failing.push(locator.into());
        self
    }

    /// Raw locators fetched so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl FetchStrategy for MockStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        self.calls.borrow_mut().push(locator.raw().to_string());
        on_line(&format!("{} fetching {}", self.name, locator));

        if self.failing.iter().any(|f| f == locator.raw()) {
            return Err(Error::DownloadFailed {
                url: locator.raw().to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Pass each non-empty line of command output to `on_line`
pub(crate) fn forward_lines(output: &str, on_line: &mut dyn FnMut(&str)) {
    output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .for_each(|l| on_line(l));
}
