//! Archive sources over http, https and ftp.
//!
//! The archive is downloaded into the download dir (reused if it's already
//! there) and unpacked into a directory of the same name, minus the
//! extension, under the build dir.

use super::{FetchStrategy, forward_lines};
use crate::error::{Error, Result};
use crate::locator::{Scheme, SourceLocator};
use depkit::{ProcessExecutor, RunOptions};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Maximum download size (1 GB covers source tarballs comfortably).
const MAX_DOWNLOAD_SIZE: u64 = 1024 * 1024 * 1024;

/// Archive formats we can unpack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Tar,
    TarZst,
    Zip,
}

impl ArchiveKind {
    /// Archive kind and base name (without extension) for a file name
    pub fn detect(file_name: &str) -> Option<(Self, &str)> {
        const SUFFIXES: &[(&str, ArchiveKind)] = &[
            (".tar.gz", ArchiveKind::TarGz),
            (".tgz", ArchiveKind::TarGz),
            (".tar.zst", ArchiveKind::TarZst),
            (".tzst", ArchiveKind::TarZst),
            (".tar", ArchiveKind::Tar),
            (".zip", ArchiveKind::Zip),
        ];

        SUFFIXES.iter().find_map(|(suffix, kind)| {
            file_name
                .strip_suffix(suffix)
                .filter(|base| !base.is_empty())
                .map(|base| (*kind, base))
        })
    }
}

/// Downloads and unpacks archives
pub struct ArchiveStrategy<E> {
    executor: E,
    download_dir: PathBuf,
    build_dir: PathBuf,
    agent: ureq::Agent,
}

impl<E: ProcessExecutor> ArchiveStrategy<E> {
    pub fn new(executor: E, download_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            download_dir: download_dir.into(),
            build_dir: build_dir.into(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Download `locator` unless it's already in the download dir
    pub fn download(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<PathBuf> {
        let file_name = locator
            .file_name()
            .ok_or_else(|| Error::UnknownArchive(locator.raw().to_string()))?;
        let target = self.download_dir.join(file_name);

        if target.is_file() {
            log::debug!("Reusing {}", target.display());
            on_line(&format!("Already downloaded {}", file_name));
            return Ok(target);
        }

        fs::create_dir_all(&self.download_dir).map_err(|e| Error::io(&self.download_dir, e))?;
        let partial = self.download_dir.join(format!("{}.part", file_name));
        on_line(&format!("Downloading {}", locator));

        let result = match locator.scheme() {
            Scheme::Http | Scheme::Https => self.download_http(locator, &partial),
            _ => self.download_with_curl(locator, &partial, on_line),
        };
        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        fs::rename(&partial, &target).map_err(|e| Error::io(&target, e))?;
        Ok(target)
    }

    fn download_http(&self, locator: &SourceLocator, dest: &Path) -> Result<()> {
        let mut response = self
            .agent
            .get(locator.raw())
            .header("User-Agent", concat!("fetchkit/", env!("CARGO_PKG_VERSION")))
            .call()?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_DOWNLOAD_SIZE)
            .read_to_vec()
            .map_err(|e| Error::DownloadFailed {
                url: locator.raw().to_string(),
                message: e.to_string(),
            })?;

        fs::write(dest, bytes).map_err(|e| Error::io(dest, e))
    }

    fn download_with_curl(
        &self,
        locator: &SourceLocator,
        dest: &Path,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<()> {
        let dest_str = dest.to_string_lossy().into_owned();
        let output = self.executor.run(
            "curl",
            &["-fsSL", "-o", dest_str.as_str(), locator.raw()],
            &RunOptions::failable().spinner(true),
        )?;
        forward_lines(&output.stderr_str(), on_line);

        if output.success {
            Ok(())
        } else {
            Err(Error::DownloadFailed {
                url: locator.raw().to_string(),
                message: output.stderr_str().trim().to_string(),
            })
        }
    }
}

/// Unpack `archive` into `dest`, reporting each entry to `on_line`
pub fn extract(archive: &Path, kind: ArchiveKind, dest: &Path, on_line: &mut dyn FnMut(&str)) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
    let reader = BufReader::new(file);

    let failed = |message: String| Error::ExtractionFailed {
        archive: archive.to_path_buf(),
        message,
    };

    match kind {
        ArchiveKind::TarGz => unpack_tar(flate2::read::GzDecoder::new(reader), dest, on_line)
            .map_err(|e| failed(e.to_string())),
        ArchiveKind::Tar => unpack_tar(reader, dest, on_line).map_err(|e| failed(e.to_string())),
        ArchiveKind::TarZst => {
            let decoder = zstd::Decoder::new(reader).map_err(|e| failed(e.to_string()))?;
            unpack_tar(decoder, dest, on_line).map_err(|e| failed(e.to_string()))
        }
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(reader).map_err(|e| failed(e.to_string()))?;
            for name in zip.file_names() {
                on_line(name);
            }
            zip.extract(dest).map_err(|e| failed(e.to_string()))
        }
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, on_line: &mut dyn FnMut(&str)) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().into_owned();
        on_line(&path);
        entry.unpack_in(dest)?;
    }
    Ok(())
}

impl<E: ProcessExecutor> FetchStrategy for ArchiveStrategy<E> {
    fn name(&self) -> &str {
        "archive"
    }

    fn fetch(&self, locator: &SourceLocator, on_line: &mut dyn FnMut(&str)) -> Result<()> {
        let file_name = locator.file_name().unwrap_or_default();
        let (kind, base) = ArchiveKind::detect(file_name)
            .ok_or_else(|| Error::UnknownArchive(file_name.to_string()))?;
        let archive = self.download(locator, on_line)?;

        let dest = self.build_dir.join(base);
        on_line(&format!("Extracting {} into {}", file_name, dest.display()));
        extract(&archive, kind, &dest, on_line)
    }
}
