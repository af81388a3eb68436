//! Collaborator traits
//!
//! These traits let depkit be used without depending on a particular
//! process runner or dependency engine. The outer binary supplies real
//! implementations; tests supply in-memory ones.

use crate::error::Result;
use crate::types::{CommandOutput, RunOptions, SourceLocation};
use std::path::Path;

/// Runs external commands
///
/// Implement this trait to provide process execution. A non-zero exit is
/// reported through [`CommandOutput::success`], not as an error; `Err` is
/// reserved for commands that could not be run at all.
pub trait ProcessExecutor {
    /// Run a command with the given options
    fn run(&self, cmd: &str, args: &[&str], opts: &RunOptions) -> Result<CommandOutput>;

    /// Run a command and return just success/failure
    fn run_status(&self, cmd: &str, args: &[&str]) -> Result<bool> {
        Ok(self.run(cmd, args, &RunOptions::failable())?.success)
    }

    /// Run a command and capture trimmed stdout, failing on non-zero exit
    fn run_capture(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = self.run(cmd, args, &RunOptions::new())?;
        if !output.success {
            return Err(crate::Error::CommandFailed {
                command: format!("{} {}", cmd, args.join(" ")),
                message: output.stderr_str().trim().to_string(),
            });
        }
        Ok(output.stdout_str().trim().to_string())
    }
}

impl<E: ProcessExecutor + ?Sized> ProcessExecutor for &E {
    fn run(&self, cmd: &str, args: &[&str], opts: &RunOptions) -> Result<CommandOutput> {
        (**self).run(cmd, args, opts)
    }
}

/// The dependency a decision is being made for
///
/// This is deliberately narrow: choice blocks and fetchers may look up
/// variables, give up on unsupported platforms and declare extra
/// requirements, but can't reach anything else on the dependency.
pub trait DepContext {
    /// Dependency name
    fn name(&self) -> &str;

    /// Where the dependency was declared, if known
    fn source_location(&self) -> Option<SourceLocation> {
        None
    }

    /// Look up a user-supplied variable
    fn var(&self, name: &str) -> Option<String>;

    /// Mark the dependency as permanently unmeetable
    fn mark_unmeetable(&self, message: &str);

    /// Declare that the dependency needs these other dependencies
    fn require(&self, deps: &[String]);
}

/// The component's own install mechanism
///
/// Used to tell commands we installed apart from ones that came from
/// somewhere else on the system.
pub trait InstallSource {
    /// Display name (e.g. "homebrew")
    fn name(&self) -> &str;

    /// Whether a command resolved to `dir` was installed by us
    fn provides(&self, cmd_name: &str, dir: &Path) -> bool;
}

/// An install source identified by the directories it installs binaries into
#[derive(Debug, Clone)]
pub struct PrefixInstallSource {
    name: String,
    bin_dirs: Vec<std::path::PathBuf>,
}

impl PrefixInstallSource {
    pub fn new(name: impl Into<String>, bin_dirs: Vec<std::path::PathBuf>) -> Self {
        Self {
            name: name.into(),
            bin_dirs,
        }
    }

    pub fn bin_dirs(&self) -> &[std::path::PathBuf] {
        &self.bin_dirs
    }
}

impl InstallSource for PrefixInstallSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self, _cmd_name: &str, dir: &Path) -> bool {
        self.bin_dirs.iter().any(|d| d == dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_install_source() {
        let brew = PrefixInstallSource::new("homebrew", vec!["/opt/homebrew/bin".into()]);
        assert_eq!(brew.name(), "homebrew");
        assert!(brew.provides("git", Path::new("/opt/homebrew/bin")));
        assert!(!brew.provides("git", Path::new("/usr/bin")));
        assert!(!brew.provides("git", Path::new("/opt/homebrew")));
    }
}
