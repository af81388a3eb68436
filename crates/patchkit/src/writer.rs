//! Writing patched content back to disk
//!
//! The patcher never touches files directly. It hands the final content to a
//! [`PrivilegedWriter`], which decides how to get it there: a plain atomic
//! write, an elevated write as the file's owner, or nothing at all (dry-run).

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Owner identity of an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

impl FileOwner {
    /// Owner of `path`, or `None` if it doesn't exist
    #[cfg(unix)]
    pub fn of(path: &Path) -> Result<Option<Self>> {
        use std::os::unix::fs::MetadataExt;

        match fs::metadata(path) {
            Ok(meta) => Ok(Some(Self {
                uid: meta.uid(),
                gid: meta.gid(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    #[cfg(not(unix))]
    pub fn of(_path: &Path) -> Result<Option<Self>> {
        Ok(None)
    }
}

/// Writes whole-file content, optionally as another user
pub trait PrivilegedWriter {
    /// Replace the contents of `path` with `content`.
    ///
    /// When `elevate` is set the current user can't write the file and the
    /// write must happen as `owner`. Implementations must not leave a
    /// half-written file behind.
    fn write_as(
        &self,
        owner: Option<&FileOwner>,
        path: &Path,
        content: &str,
        elevate: bool,
    ) -> Result<()>;
}

impl<W: PrivilegedWriter + ?Sized> PrivilegedWriter for &W {
    fn write_as(
        &self,
        owner: Option<&FileOwner>,
        path: &Path,
        content: &str,
        elevate: bool,
    ) -> Result<()> {
        (**self).write_as(owner, path, content, elevate)
    }
}

/// Whether the current user can write `path` (or create it, if missing)
#[cfg(unix)]
pub fn is_writable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let target = if path.exists() { path } else { parent_dir(path) };

    let Ok(c_path) = CString::new(target.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
pub fn is_writable(path: &Path) -> bool {
    fs::metadata(path).map_or(true, |m| !m.permissions().readonly())
}

/// Directory a new sibling of `path` would be created in
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// How [`DirectWriter`] puts content in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write a sibling temp file, then rename it over the target
    Staged,
    /// Truncate and rewrite the target itself
    InPlace,
}

impl WriteMode {
    /// Staged when the directory takes new files, in place otherwise.
    ///
    /// A writable file in a read-only directory can still be rewritten,
    /// just not atomically.
    pub fn for_path(path: &Path) -> Self {
        if is_writable(parent_dir(path)) || !path.exists() {
            Self::Staged
        } else {
            Self::InPlace
        }
    }
}

/// Sibling path used for atomic replacement
pub fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.patch-{}", name, std::process::id()))
}

/// Writes as the current user via temp file + rename
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectWriter;

impl PrivilegedWriter for DirectWriter {
    fn write_as(
        &self,
        owner: Option<&FileOwner>,
        path: &Path,
        content: &str,
        elevate: bool,
    ) -> Result<()> {
        if elevate {
            return Err(Error::ElevationUnavailable {
                path: path.to_path_buf(),
            });
        }

        if WriteMode::for_path(path) == WriteMode::InPlace {
            log::debug!("{} isn't writable, rewriting {} in place", parent_dir(path).display(), path.display());
            return fs::write(path, content).map_err(|e| Error::io(path, e));
        }

        let staging = staging_path(path);
        fs::write(&staging, content).map_err(|e| Error::io(&staging, e))?;

        if let Ok(meta) = fs::metadata(path) {
            if let Err(e) = fs::set_permissions(&staging, meta.permissions()) {
                log::debug!("Couldn't copy permissions onto {}: {}", staging.display(), e);
            }
        }

        #[cfg(unix)]
        if let Some(owner) = owner {
            if let Err(e) = std::os::unix::fs::chown(&staging, Some(owner.uid), Some(owner.gid)) {
                log::debug!("Couldn't restore owner of {}: {}", path.display(), e);
            }
        }
        #[cfg(not(unix))]
        let _ = owner;

        if let Err(e) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(Error::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
        Ok(())
    }
}

/// A write captured instead of performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub path: PathBuf,
    pub content: String,
    pub elevate: bool,
}

/// Captures writes without touching the filesystem
#[derive(Debug, Default)]
pub struct RecordingWriter {
    writes: RefCell<Vec<RecordedWrite>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }

    /// Content of the last write to `path`
    pub fn last_for(&self, path: &Path) -> Option<String> {
        self.writes
            .borrow()
            .iter()
            .rev()
            .find(|w| w.path == path)
            .map(|w| w.content.clone())
    }
}

impl PrivilegedWriter for RecordingWriter {
    fn write_as(
        &self,
        _owner: Option<&FileOwner>,
        path: &Path,
        content: &str,
        elevate: bool,
    ) -> Result<()> {
        self.writes.borrow_mut().push(RecordedWrite {
            path: path.to_path_buf(),
            content: content.to_string(),
            elevate,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_direct_write_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hosts");
        fs::write(&path, "old\n").unwrap();

        DirectWriter.write_as(None, &path, "new\n", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_direct_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh.conf");

        DirectWriter.write_as(None, &path, "x = 1\n", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_direct_writer_refuses_elevation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hosts");
        fs::write(&path, "old\n").unwrap();

        let err = DirectWriter.write_as(None, &path, "new\n", true).unwrap_err();

        assert!(matches!(err, Error::ElevationUnavailable { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_direct_write_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("script.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        DirectWriter
            .write_as(None, &path, "#!/bin/sh\necho hi\n", false)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_owner_of() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("owned");
        fs::write(&path, "").unwrap();

        assert!(FileOwner::of(&path).unwrap().is_some());
        assert!(FileOwner::of(&temp.path().join("missing")).unwrap().is_none());
    }

    #[test]
    fn test_is_writable_for_missing_file_checks_parent() {
        let temp = TempDir::new().unwrap();
        assert!(is_writable(&temp.path().join("not-yet")));
    }

    #[test]
    fn test_write_mode_for_new_file_is_staged() {
        let temp = TempDir::new().unwrap();
        assert_eq!(WriteMode::for_path(&temp.path().join("new.conf")), WriteMode::Staged);
    }

    #[cfg(unix)]
    #[test]
    fn test_writable_file_in_read_only_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("locked");
        fs::create_dir(&dir).unwrap();
        let path = dir.join("f.conf");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o666)).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions, everyone else gets the fallback
        let expected = if is_writable(&dir) {
            WriteMode::Staged
        } else {
            WriteMode::InPlace
        };
        assert_eq!(WriteMode::for_path(&path), expected);

        let result = DirectWriter.write_as(None, &path, "new\n", false);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        result.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_recording_writer_captures() {
        let writer = RecordingWriter::new();
        let path = Path::new("/etc/motd");

        writer.write_as(None, path, "one", false).unwrap();
        writer.write_as(None, path, "two", true).unwrap();

        assert_eq!(writer.writes().len(), 2);
        assert!(writer.writes()[1].elevate);
        assert_eq!(writer.last_for(path).as_deref(), Some("two"));
        assert!(!path.with_file_name("motd-never").exists());
    }
}
