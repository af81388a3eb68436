//! Git sources: clone into the build dir, or fetch if already cloned.

use super::{FetchStrategy, forward_lines};
use crate::error::{Error, Result};
use crate::locator::SourceLocator;
use depkit::{ProcessExecutor, RunOptions};
use std::path::{Path, PathBuf};

pub struct GitStrategy<E> {
    executor: E,
    build_dir: PathBuf,
}

impl<E: ProcessExecutor> GitStrategy<E> {
    pub fn new(executor: E, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            build_dir: build_dir.into(),
        }
    }

    /// Where `locator` gets checked out
    pub fn checkout_dir(&self, locator: &SourceLocator) -> Result<PathBuf> {
        locator
            .checkout_name()
            .map(|name| self.build_dir.join(name))
            .ok_or_else(|| Error::InvalidLocator {
                locator: locator.raw().to_string(),
                message: "no repository name in path".to_string(),
            })
    }

    fn git(&self, args: &[&str], on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let output = self
            .executor
            .run("git", args, &RunOptions::failable().spinner(true))?;
        forward_lines(&output.stdout_str(), on_line);
        forward_lines(&output.stderr_str(), on_line);

        if output.success {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: output.stderr_str().trim().to_string(),
            })
        }
    }
}

fn is_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

impl<E: ProcessExecutor> FetchStrategy for GitStrategy<E> {
    fn name(&self) -> &str {
        "git"
    }

    fn fetch(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let dir = self.checkout_dir(locator)?;
        let dir_str = dir.to_string_lossy().into_owned();

        if is_checkout(&dir) {
            log::debug!("{} is already cloned, fetching", dir.display());
            self.git(&["-C", dir_str.as_str(), "fetch", "--quiet", "origin"], on_line)
        } else {
            std::fs::create_dir_all(&self.build_dir).map_err(|e| Error::io(&self.build_dir, e))?;
            self.git(&["clone", locator.raw(), dir_str.as_str()], on_line)
        }
    }
}
