//! provision.toml
//!
//! Every section is optional; a missing file means all defaults.
//!
//! ```toml
//! [marker]
//! comment_char = "#"
//!
//! [install]
//! name = "homebrew"
//! bin_dirs = ["/opt/homebrew/bin", "/opt/homebrew/sbin"]
//!
//! [fetch]
//! download_dir = "~/.cache/provision/downloads"
//! build_dir = "~/.cache/provision/build"
//!
//! [sudo]
//! enabled = true
//!
//! [vars]
//! username = "deploy"
//! ```

use anyhow::{Context, Result};
use depkit::PrefixInstallSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub marker: MarkerConfig,
    pub install: InstallConfig,
    pub fetch: FetchConfig,
    pub sudo: SudoConfig,
    /// Values exposed to choice blocks
    pub vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Comment character for marker lines
    pub comment_char: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            comment_char: "#".to_string(),
        }
    }
}

/// Our own install mechanism: commands found in these dirs are "ours"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub name: String,
    pub bin_dirs: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            bin_dirs: vec!["/usr/local/bin".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub download_dir: Option<String>,
    pub build_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SudoConfig {
    /// Whether files we can't write may be written as their owner via sudo
    pub enabled: bool,
}

impl Config {
    /// Load from the default location, or defaults if there's no file
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn download_dir(&self) -> Result<PathBuf> {
        match &self.fetch.download_dir {
            Some(dir) => Ok(paths::expand(dir)),
            None => Ok(paths::cache_dir()?.join("downloads")),
        }
    }

    pub fn build_dir(&self) -> Result<PathBuf> {
        match &self.fetch.build_dir {
            Some(dir) => Ok(paths::expand(dir)),
            None => Ok(paths::cache_dir()?.join("build")),
        }
    }

    pub fn install_source(&self) -> PrefixInstallSource {
        PrefixInstallSource::new(
            self.install.name.clone(),
            self.install.bin_dirs.iter().map(|d| paths::expand(d)).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depkit::InstallSource;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.marker.comment_char, "#");
        assert_eq!(config.install.name, "local");
        assert!(!config.sudo.enabled);
        assert!(config.vars.is_empty());
    }

    #[test]
    fn test_parse_partial() {
        let config = Config::parse(
            r#"
[install]
name = "homebrew"
bin_dirs = ["/opt/homebrew/bin"]

[vars]
username = "deploy"
"#,
        )
        .unwrap();

        assert_eq!(config.install.name, "homebrew");
        assert_eq!(config.marker.comment_char, "#");
        assert_eq!(config.vars.get("username").map(String::as_str), Some("deploy"));

        let source = config.install_source();
        assert_eq!(source.name(), "homebrew");
        assert!(source.provides("brew", Path::new("/opt/homebrew/bin")));
        assert!(!source.provides("git", Path::new("/usr/bin")));
    }

    #[test]
    fn test_explicit_fetch_dirs() {
        let config = Config::parse(
            r#"
[fetch]
download_dir = "/srv/downloads"
build_dir = "/srv/build"
"#,
        )
        .unwrap();
        assert_eq!(config.download_dir().unwrap(), PathBuf::from("/srv/downloads"));
        assert_eq!(config.build_dir().unwrap(), PathBuf::from("/srv/build"));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("provision.toml")).unwrap();
        assert_eq!(config.install.bin_dirs, vec!["/usr/local/bin".to_string()]);
    }

    #[test]
    fn test_load_invalid_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provision.toml");
        fs::write(&path, "[sudo]\nenabled = \"maybe\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("provision.toml"));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = Config::default();
        config.sudo.enabled = true;
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(Config::parse(&text).unwrap().sudo.enabled);
    }
}
