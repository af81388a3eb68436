//! Elevated file writes
//!
//! Files the current user can't write are written as their owner:
//! 1. The new content is piped into `sudo -u #<uid> tee` writing a sibling temp file
//! 2. The temp file gets the original file's mode
//! 3. `sudo -u #<uid> mv` puts it in place
//!
//! Sudo is only validated (and the password prompt shown) when the first
//! elevated write actually happens, and released again on drop.

use depkit::{ProcessExecutor, RunOptions};
use patchkit::{DirectWriter, Error, FileOwner, PrivilegedWriter, Result};
use std::cell::Cell;
use std::path::Path;
use std::process::Command;

/// Privileged writer backed by sudo
pub struct SudoWriter<E> {
    executor: E,
    enabled: bool,
    validated: Cell<bool>,
}

impl<E: ProcessExecutor> SudoWriter<E> {
    pub fn new(executor: E, enabled: bool) -> Self {
        Self {
            executor,
            enabled,
            validated: Cell::new(false),
        }
    }

    /// Acquire sudo privileges with a reason shown to the user
    fn acquire(&self, path: &Path) -> Result<()> {
        if self.validated.get() || is_valid() {
            self.validated.set(true);
            return Ok(());
        }

        eprintln!();
        eprintln!("  Sudo required: writing {}", path.display());
        eprintln!();

        let ok = Command::new("sudo")
            .args(["-v"])
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !ok {
            return Err(Error::ElevationUnavailable {
                path: path.to_path_buf(),
            });
        }
        self.validated.set(true);
        Ok(())
    }

    fn run_as(&self, user: &str, cmd: &str, args: &[&str], input: Option<&str>) -> Result<()> {
        let mut opts = RunOptions::new().as_user(user);
        if let Some(input) = input {
            opts = opts.input(input);
        }

        let failed = |message: String| Error::WriteFailed {
            path: args.last().map(Into::into).unwrap_or_default(),
            message,
        };

        let output = self
            .executor
            .run(cmd, args, &opts)
            .map_err(|e| failed(e.to_string()))?;
        if output.success {
            Ok(())
        } else {
            Err(failed(format!("{} failed: {}", cmd, output.stderr_str().trim())))
        }
    }

    fn write_elevated(&self, owner: Option<&FileOwner>, path: &Path, content: &str) -> Result<()> {
        let user = owner.map_or_else(|| "root".to_string(), |o| format!("#{}", o.uid));
        let staging = patchkit::writer::staging_path(path);
        let staging_str = staging.to_string_lossy().into_owned();
        let path_str = path.to_string_lossy().into_owned();

        self.run_as(&user, "tee", &[staging_str.as_str()], Some(content))?;

        let result = file_mode(path)
            .map_or(Ok(()), |mode| {
                let mode = format!("{mode:o}");
                self.run_as(&user, "chmod", &[mode.as_str(), staging_str.as_str()], None)
            })
            .and_then(|()| {
                self.run_as(&user, "mv", &["-f", staging_str.as_str(), path_str.as_str()], None)
            });

        if result.is_err() {
            let _ = self.run_as(&user, "rm", &["-f", staging_str.as_str()], None);
        }
        result
    }
}

impl<E: ProcessExecutor> PrivilegedWriter for SudoWriter<E> {
    fn write_as(
        &self,
        owner: Option<&FileOwner>,
        path: &Path,
        content: &str,
        elevate: bool,
    ) -> Result<()> {
        if !elevate {
            return DirectWriter.write_as(owner, path, content, false);
        }
        if !self.enabled {
            return Err(Error::ElevationUnavailable {
                path: path.to_path_buf(),
            });
        }

        self.acquire(path)?;
        log::debug!("Writing {} via sudo", path.display());
        self.write_elevated(owner, path, content)
    }
}

impl<E> Drop for SudoWriter<E> {
    fn drop(&mut self) {
        if self.validated.get() {
            // Invalidate sudo timestamp to release privileges
            let _ = Command::new("sudo").args(["-k"]).status();
        }
    }
}

/// Check if sudo is currently valid (without prompting)
fn is_valid() -> bool {
    Command::new("sudo")
        .args(["-n", "true"])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use depkit::CommandOutput;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockSudo {
        calls: RefCell<Vec<(Option<String>, String, Option<String>)>>,
        fail_on: Option<&'static str>,
    }

    impl ProcessExecutor for MockSudo {
        fn run(&self, cmd: &str, args: &[&str], opts: &RunOptions) -> depkit::Result<CommandOutput> {
            self.calls.borrow_mut().push((
                opts.as_user.clone(),
                format!("{} {}", cmd, args.join(" ")),
                opts.input.clone(),
            ));
            if self.fail_on == Some(cmd) {
                Ok(CommandOutput::failed("Operation not permitted"))
            } else {
                Ok(CommandOutput::ok(""))
            }
        }
    }

    fn writer(mock: &MockSudo) -> SudoWriter<&MockSudo> {
        let writer = SudoWriter::new(mock, true);
        writer.validated.set(true);
        writer
    }

    #[test]
    fn test_plain_write_when_not_elevating() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("conf");
        let mock = MockSudo::default();

        SudoWriter::new(&mock, false)
            .write_as(None, &path, "x\n", false)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
        assert!(mock.calls.borrow().is_empty());
    }

    #[test]
    fn test_elevation_disabled() {
        let mock = MockSudo::default();
        let err = SudoWriter::new(&mock, false)
            .write_as(None, Path::new("/etc/hosts"), "x", true)
            .unwrap_err();
        assert!(matches!(err, Error::ElevationUnavailable { .. }));
    }

    #[test]
    fn test_elevated_write_as_owner() {
        let mock = MockSudo::default();
        let owner = FileOwner { uid: 0, gid: 0 };

        writer(&mock)
            .write_as(Some(&owner), Path::new("/nonexistent/hosts"), "127.0.0.1 db\n", true)
            .unwrap();

        let calls = mock.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0.as_deref(), Some("#0"));
        assert!(calls[0].1.starts_with("tee /nonexistent/.hosts.patch-"));
        assert_eq!(calls[0].2.as_deref(), Some("127.0.0.1 db\n"));
        assert!(calls[1].1.starts_with("mv -f /nonexistent/.hosts.patch-"));
        assert!(calls[1].1.ends_with(" /nonexistent/hosts"));
    }

    #[test]
    fn test_failed_move_cleans_up() {
        let mock = MockSudo {
            fail_on: Some("mv"),
            ..MockSudo::default()
        };

        let err = writer(&mock)
            .write_as(None, Path::new("/nonexistent/hosts"), "x", true)
            .unwrap_err();

        assert!(matches!(err, Error::WriteFailed { .. }));
        let calls = mock.calls.borrow();
        assert_eq!(calls[0].0.as_deref(), Some("root"));
        assert!(calls.last().unwrap().1.starts_with("rm -f /nonexistent/.hosts.patch-"));
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_carried_over() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("script");
        std::fs::write(&path, "").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o750)).unwrap();
        let mock = MockSudo::default();

        writer(&mock).write_as(None, &path, "x", true).unwrap();

        assert!(mock.calls.borrow()[1].1.starts_with("chmod 750 "));
    }
}
