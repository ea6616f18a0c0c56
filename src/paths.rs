//! Config file location
//!
//! # Environment Variables
//!
//! - `ORGSYNC_CONFIG_DIR` - Override config directory (e.g., `~/ops/orgsync`)
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config <path>` on the command line
//! 2. `ORGSYNC_CONFIG_DIR/orgsync.toml`
//! 3. `XDG_CONFIG_HOME/orgsync/orgsync.toml` (if set)
//! 4. `~/.config/orgsync/orgsync.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ORGSYNC_CONFIG_DIR";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "orgsync.toml";

/// Resolve the config file, honouring an explicit `--config` path first
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using config file from --config: {}", path.display());
        return Ok(path);
    }
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Get the orgsync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("orgsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("orgsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand `~` and environment variables in a path
///
/// Unknown variables are left as-is.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

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

    #[test]
    fn test_explicit_config_wins() {
        let result = config_file(Some(Path::new("/etc/orgsync/prod.toml"))).unwrap();
        assert_eq!(result, PathBuf::from("/etc/orgsync/prod.toml"));
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/orgsync", || {
            let result = config_file(None).unwrap();
            assert_eq!(result, PathBuf::from("/custom/orgsync/orgsync.toml"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/ops/orgsync.toml");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("ops").join("orgsync.toml"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_ORGSYNC_VAR_12345/file");
        assert_eq!(
            result,
            PathBuf::from("/path/$NONEXISTENT_ORGSYNC_VAR_12345/file")
        );
    }
}
