//! Host platform detection.
//!
//! Provides the candidate ordering for platform choices: most specific
//! identifier first (distribution flavour, e.g. `ubuntu`), then the system
//! (`linux`, `osx`).
//!
//! # Example
//!
//! ```no_run
//! use depkit::host::Host;
//!
//! let host = Host::current();
//! println!("{}: {:?}", host.description(), host.match_list());
//! ```

use crate::context::ProcessExecutor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

const OS_RELEASE: &str = "/etc/os-release";

/// The machine dependencies are being converged on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// System identifier: `linux`, `osx`, `windows`, ...
    pub system: String,
    /// Distribution, when the system has several (e.g. `ubuntu`)
    pub flavour: Option<String>,
    /// Release version (e.g. `22.04`, `14.5`)
    pub release: Option<String>,
    /// CPU architecture
    pub arch: String,
}

impl Host {
    pub fn new(system: &str, flavour: Option<&str>, release: Option<&str>, arch: &str) -> Self {
        Self {
            system: system.to_string(),
            flavour: flavour.map(str::to_string),
            release: release.map(str::to_string),
            arch: arch.to_string(),
        }
    }

    /// Detect the current host without running any commands
    ///
    /// The macOS release needs `sw_vers`; use [`Host::detect`] for that.
    pub fn current() -> Self {
        let system = system_name(std::env::consts::OS);
        let os_release = read_os_release();
        Self {
            flavour: os_release.get("ID").cloned(),
            release: os_release.get("VERSION_ID").cloned(),
            system: system.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Detect the current host, asking the system for details where needed
    pub fn detect<E: ProcessExecutor>(executor: &E) -> Self {
        let mut host = Self::current();
        if host.system == "osx" {
            host.flavour = None;
            host.release = executor
                .run_capture("sw_vers", &["-productVersion"])
                .map_err(|e| log::debug!("sw_vers failed: {}", e))
                .ok()
                .filter(|v| !v.is_empty());
        }
        log::debug!("Detected host: {:?}", host);
        host
    }

    /// Choice names this host answers to, most specific first
    pub fn match_list(&self) -> Vec<String> {
        let mut list = Vec::new();
        if let Some(flavour) = &self.flavour {
            if flavour != &self.system {
                list.push(flavour.clone());
            }
        }
        list.push(self.system.clone());
        list
    }

    /// Human-readable name and release, e.g. "ubuntu 22.04"
    pub fn description(&self) -> String {
        let name = self.flavour.as_deref().unwrap_or(&self.system);
        match &self.release {
            Some(release) => format!("{} {}", name, release),
            None => name.to_string(),
        }
    }
}

/// Map Rust's OS name onto the identifiers used in choices
fn system_name(os: &str) -> &str {
    match os {
        "macos" => "osx",
        other => other,
    }
}

fn read_os_release() -> HashMap<String, String> {
    fs::read_to_string(OS_RELEASE)
        .map(|content| parse_os_release(&content))
        .unwrap_or_default()
}

/// Parse `KEY=value` lines from an os-release file
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_string(),
                value.trim().trim_matches('"').trim_matches('\'').to_string(),
            )
        })
        .collect()
}
