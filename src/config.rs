//! # CLI Configuration
//!
//! This module defines the `.cauldron.yaml` configuration file used by the
//! `cauldron` command-line tool, and the logic for locating, parsing and
//! saving it. The library itself never reads this file: commands turn it
//! into explicit [`StoreSettings`].
//!
//! ## Format
//!
//! ```yaml
//! repositories:
//!   default: git@github.com:org/cauldron.git
//!   staging: /srv/git/cauldron-staging.git
//! repositoryInUse: default
//! branch: master
//! manifest: ./manifest.yaml
//! ```
//!
//! ## Lookup
//!
//! An explicit path (`--config` or `CAULDRON_CONFIG`) wins. Otherwise
//! `./.cauldron.yaml` is used when it exists, then `~/.cauldron/config.yaml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::{default_user_config, DEFAULT_BRANCH, DEFAULT_CONFIG_FILENAME};
use crate::error::{Error, Result};
use crate::repository::StoreSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Remote URL per alias.
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,
    /// Alias of the Cauldron commands operate on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_in_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Manifest catalogue used to resolve versionless dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

/// Parse a configuration from YAML. An empty document is an empty
/// configuration.
pub fn parse(yaml: &str) -> Result<CliConfig> {
    if yaml.trim().is_empty() {
        return Ok(CliConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read the configuration at `path`.
pub fn from_file(path: &Path) -> Result<CliConfig> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

/// Read the configuration at `path`, or an empty one if the file is missing.
pub fn load_or_default(path: &Path) -> Result<CliConfig> {
    if path.exists() {
        from_file(path)
    } else {
        Ok(CliConfig::default())
    }
}

/// The configuration file to use.
pub fn locate(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILENAME);
    if local.exists() {
        local
    } else {
        default_user_config()
    }
}

impl CliConfig {
    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Register `url` under `alias`. The first repository added becomes the
    /// one in use.
    pub fn add_repository(&mut self, alias: &str, url: &str) -> Result<()> {
        validate_alias(alias)?;
        if self.repositories.contains_key(alias) {
            return Err(Error::AlreadyExists {
                what: format!("Cauldron repository alias {}", alias),
            });
        }
        self.repositories.insert(alias.to_string(), url.to_string());
        if self.repository_in_use.is_none() {
            self.repository_in_use = Some(alias.to_string());
        }
        Ok(())
    }

    pub fn use_repository(&mut self, alias: &str) -> Result<()> {
        if !self.repositories.contains_key(alias) {
            return Err(Error::Config {
                message: format!("No Cauldron repository is registered as {}", alias),
                hint: Some(format!("Run `cauldron repo add {} <url>` first", alias)),
            });
        }
        self.repository_in_use = Some(alias.to_string());
        Ok(())
    }

    /// Alias and URL of the repository in use.
    pub fn current(&self) -> Result<(&str, &str)> {
        let alias = self.repository_in_use.as_deref().ok_or_else(|| Error::Config {
            message: "No Cauldron repository in use".to_string(),
            hint: Some("Run `cauldron repo add <alias> <url>` or `cauldron repo use <alias>`".to_string()),
        })?;
        let url = self.repositories.get(alias).ok_or_else(|| Error::Config {
            message: format!("Cauldron repository in use ({}) is not registered", alias),
            hint: Some("Run `cauldron repo list` to see registered repositories".to_string()),
        })?;
        Ok((alias, url))
    }

    /// Settings of the repository in use, with its working copy under
    /// `cauldron_root`.
    pub fn store_settings(&self, cauldron_root: &Path) -> Result<StoreSettings> {
        let (alias, url) = self.current()?;
        Ok(StoreSettings {
            repository: url.to_string(),
            branch: self.branch().to_string(),
            path: cauldron_root.join(alias),
        })
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    let valid = !alias.is_empty()
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && alias != "."
        && alias != "..";
    if valid {
        Ok(())
    } else {
        Err(Error::invalid(
            "alias",
            format!(
                "'{}' may only contain letters, digits, '-', '_' and '.'",
                alias
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
repositories:
  default: git@github.com:org/cauldron.git
repositoryInUse: default
branch: main
manifest: ./manifest.yaml
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.branch(), "main");
        assert_eq!(config.manifest, Some(PathBuf::from("./manifest.yaml")));
        assert_eq!(
            config.current().unwrap(),
            ("default", "git@github.com:org/cauldron.git")
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.branch(), DEFAULT_BRANCH);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(matches!(
            parse("repositories: [").unwrap_err(),
            Error::Yaml(_)
        ));
    }

    #[test]
    fn test_add_and_use_repositories() {
        let mut config = CliConfig::default();
        config.add_repository("prod", "git@example.com:prod.git").unwrap();
        config.add_repository("qa", "git@example.com:qa.git").unwrap();
        assert_eq!(config.current().unwrap().0, "prod");

        config.use_repository("qa").unwrap();
        assert_eq!(config.current().unwrap().1, "git@example.com:qa.git");

        assert!(matches!(
            config.add_repository("qa", "other").unwrap_err(),
            Error::AlreadyExists { .. }
        ));
        assert!(matches!(
            config.use_repository("missing").unwrap_err(),
            Error::Config { .. }
        ));
    }

    #[test]
    fn test_invalid_alias() {
        let mut config = CliConfig::default();
        for alias in ["", "..", "a/b", "with space"] {
            assert!(config.add_repository(alias, "url").is_err(), "{alias:?}");
        }
    }

    #[test]
    fn test_current_without_repository() {
        let err = CliConfig::default().current().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("No Cauldron repository in use"));
        assert!(message.contains("hint:"));
    }

    #[test]
    fn test_store_settings() {
        let mut config = CliConfig::default();
        config.add_repository("prod", "git@example.com:prod.git").unwrap();
        let settings = config.store_settings(Path::new("/tmp/cauldrons")).unwrap();
        assert_eq!(settings.repository, "git@example.com:prod.git");
        assert_eq!(settings.branch, "master");
        assert_eq!(settings.path, PathBuf::from("/tmp/cauldrons/prod"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        let mut config = CliConfig::default();
        config.add_repository("prod", "git@example.com:prod.git").unwrap();
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("repositoryInUse: prod"));
        assert_eq!(load_or_default(&path).unwrap(), config);
        assert_eq!(
            load_or_default(&temp_dir.path().join("missing.yaml")).unwrap(),
            CliConfig::default()
        );
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("/etc/cauldron.yaml");
        assert_eq!(locate(Some(explicit)), explicit);
    }
}
