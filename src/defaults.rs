//! Default values for Cauldron configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILENAME: &str = ".cauldron.yaml";

/// Branch holding the Cauldron when the configuration names none.
pub const DEFAULT_BRANCH: &str = "master";

/// Returns the Cauldron home directory, `~/.cauldron`.
///
/// Falls back to `.cauldron` in the current directory if the home directory
/// cannot be determined.
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cauldron"))
        .unwrap_or_else(|| PathBuf::from(".cauldron"))
}

/// Returns the user-level configuration file, `~/.cauldron/config.yaml`.
pub fn default_user_config() -> PathBuf {
    default_home().join("config.yaml")
}

/// Returns the directory holding local Cauldron working copies.
///
/// This can be overridden by the `--cauldron-root` CLI flag or the
/// `CAULDRON_ROOT` environment variable.
pub fn default_cauldron_root() -> PathBuf {
    default_home().join("cauldrons")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cauldron_root_returns_path() {
        let root = default_cauldron_root();
        assert!(root.ends_with(".cauldron/cauldrons"));
    }

    #[test]
    fn test_default_user_config_lives_in_home() {
        assert_eq!(
            default_user_config().parent(),
            Some(default_home().as_path())
        );
    }
}
