//! Manifest providers.
//!
//! A manifest is a catalogue of supported plugin versions per platform
//! release. The Cauldron only reads it, to resolve the version of a native
//! dependency added without one.
//!
//! A file-backed [`Manifest`] is provided; it accepts YAML or JSON:
//!
//! ```yaml
//! plugins:
//!   - react-native@0.42.0
//!   - "@walmart/react-native-electrode-bridge@1.4.0"
//! platforms:
//!   "10":
//!     targetNativeDependencies: [react-native@0.40.0]
//!     targetJsDependencies: [react@15.4.1]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::error::Result;

/// Dependencies targeted by one platform release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDependencies {
    #[serde(default)]
    pub target_native_dependencies: Vec<Dependency>,
    #[serde(default)]
    pub target_js_dependencies: Vec<Dependency>,
}

impl TargetDependencies {
    /// Native dependency of the same package, if targeted.
    pub fn native(&self, dependency: &Dependency) -> Option<&Dependency> {
        self.target_native_dependencies
            .iter()
            .find(|d| d.same_package(dependency))
    }
}

/// Source of supported dependency versions.
pub trait ManifestProvider: Send + Sync {
    /// Latest supported version of the plugin named `name` (`[@scope/]name`).
    fn get_plugin(&self, name: &str) -> Option<Dependency>;

    /// Dependencies targeted by the platform release `platform_version`.
    fn get_target_native_and_js_dependencies(
        &self,
        platform_version: &str,
    ) -> Option<TargetDependencies>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub plugins: Vec<Dependency>,
    #[serde(default)]
    pub platforms: BTreeMap<String, TargetDependencies>,
}

impl Manifest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

impl ManifestProvider for Manifest {
    fn get_plugin(&self, name: &str) -> Option<Dependency> {
        self.plugins.iter().find(|p| p.package() == name).cloned()
    }

    fn get_target_native_and_js_dependencies(
        &self,
        platform_version: &str,
    ) -> Option<TargetDependencies> {
        self.platforms.get(platform_version).cloned()
    }
}
