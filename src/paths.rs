//! Centralized path resolution for provision
//!
//! # Environment Variables
//!
//! - `PROVISION_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/provision`)
//! - `PROVISION_CACHE_DIR` - Override cache directory (downloads and builds)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `PROVISION_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/provision` (if set)
//! 3. `~/.config/provision`
//!
//! For cache_dir():
//! 1. `PROVISION_CACHE_DIR` environment variable
//! 2. `XDG_CACHE_HOME/provision` (if set)
//! 3. `~/.cache/provision`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "PROVISION_CONFIG_DIR";

/// Environment variable for cache directory override
pub const ENV_CACHE_DIR: &str = "PROVISION_CACHE_DIR";

/// Name of the config file inside the config dir
pub const CONFIG_FILE: &str = "provision.toml";

/// Get the provision config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve_dir(ENV_CONFIG_DIR, "XDG_CONFIG_HOME", ".config")
}

/// Get the provision cache directory path
pub fn cache_dir() -> Result<PathBuf> {
    resolve_dir(ENV_CACHE_DIR, "XDG_CACHE_HOME", ".cache")
}

/// Path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

fn resolve_dir(override_var: &str, xdg_var: &str, home_default: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(override_var) {
        let path = expand(&dir);
        log::debug!("Using dir from {}: {}", override_var, path.display());
        return Ok(path);
    }

    if let Ok(xdg) = std::env::var(xdg_var) {
        if !xdg.is_empty() {
            let path = PathBuf::from(xdg).join("provision");
            log::debug!("Using {}: {}", xdg_var, path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(home_default).join("provision"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring it afterwards
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: Tests run in isolation
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/provision", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/provision"));
            assert_eq!(
                config_file().unwrap(),
                PathBuf::from("/custom/provision/provision.toml")
            );
        });
    }

    #[test]
    fn test_cache_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CACHE_DIR, "~/provision-cache-test", || {
            assert_eq!(cache_dir().unwrap(), home.join("provision-cache-test"));
        });
    }

    #[test]
    fn test_xdg_cache_home() {
        without_env_var(ENV_CACHE_DIR, || {
            with_env_var("XDG_CACHE_HOME", "/tmp/xdg-cache-test", || {
                assert_eq!(
                    cache_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-cache-test/provision")
                );
            });
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_default_cache_dir_unix() {
        without_env_var(ENV_CACHE_DIR, || {
            without_env_var("XDG_CACHE_HOME", || {
                let home = dirs::home_dir().unwrap();
                assert_eq!(cache_dir().unwrap(), home.join(".cache").join("provision"));
            });
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/test/path"), home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$NONEXISTENT_VAR_12345/file"),
            PathBuf::from("/path/$NONEXISTENT_VAR_12345/file")
        );
    }
}
