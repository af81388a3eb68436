//! PathProbe: find the directory a command runs from

use crate::context::ProcessExecutor;
use crate::types::RunOptions;
use std::path::{Path, PathBuf};

/// Resolves command names to directories using `which`
pub struct PathProbe<E> {
    executor: E,
}

impl<E: ProcessExecutor> PathProbe<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Full path `which` reports for a command, if any
    pub fn which(&self, cmd_name: &str) -> Option<PathBuf> {
        let output = match self
            .executor
            .run("which", &[cmd_name], &RunOptions::failable())
        {
            Ok(output) => output,
            Err(e) => {
                log::debug!("which {} could not run: {}", cmd_name, e);
                return None;
            }
        };

        if !output.success {
            return None;
        }

        let stdout = output.stdout_str();
        let found = stdout.lines().next().unwrap_or("").trim();
        // Some `which` implementations exit 0 and print "no foo in ..."
        if found.is_empty() || found.contains(&format!("no {} in", cmd_name)) {
            return None;
        }
        Some(PathBuf::from(found))
    }

    /// Directory the command runs from, if it resolves
    pub fn cmd_dir(&self, cmd_name: &str) -> Option<PathBuf> {
        self.which(cmd_name)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}
