//! The Cauldron document.
//!
//! The whole hierarchy lives in a single JSON file, `cauldron.json`, at the
//! root of the working copy:
//!
//! ```json
//! {
//!   "nativeApps": [ { "name": "MyApp", "platforms": [ ... ] } ],
//!   "manifest": {
//!     "targetNativeDependencies": [ "react-native@0.40.0" ],
//!     "targetJsDependencies": [ "react@15.4.1" ]
//!   }
//! }
//! ```
//!
//! A working copy without the file holds an empty Cauldron. Every save goes
//! through [`Validate`], so an invalid document never reaches the disk.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::descriptor::VersionCoordinates;
use crate::error::{Error, FieldError, Result};
use crate::schema::{
    field, NativeApplication, NativeApplicationPlatform, NativeApplicationVersion, Platform,
    Validate,
};

/// File name of the document, relative to the working copy root.
pub const CAULDRON_DOCUMENT: &str = "cauldron.json";

/// Target dependency lists recorded in the Cauldron itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOverrides {
    #[serde(default)]
    pub target_native_dependencies: Vec<Dependency>,
    #[serde(default)]
    pub target_js_dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CauldronDocument {
    #[serde(default)]
    pub native_apps: Vec<NativeApplication>,
    #[serde(default)]
    pub manifest: ManifestOverrides,
}

impl CauldronDocument {
    pub fn app(&self, name: &str) -> Result<&NativeApplication> {
        self.native_apps
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::not_found(format!("native application {}", name)))
    }

    pub fn app_mut(&mut self, name: &str) -> Result<&mut NativeApplication> {
        self.native_apps
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::not_found(format!("native application {}", name)))
    }

    pub fn platform(&self, name: &str, platform: Platform) -> Result<&NativeApplicationPlatform> {
        self.app(name)?
            .platform(platform)
            .ok_or_else(|| Error::not_found(format!("platform {}:{}", name, platform)))
    }

    pub fn platform_mut(
        &mut self,
        name: &str,
        platform: Platform,
    ) -> Result<&mut NativeApplicationPlatform> {
        self.app_mut(name)?
            .platform_mut(platform)
            .ok_or_else(|| Error::not_found(format!("platform {}:{}", name, platform)))
    }

    pub fn version(&self, coords: VersionCoordinates<'_>) -> Result<&NativeApplicationVersion> {
        self.platform(coords.name, coords.platform)?
            .version(coords.version)
            .ok_or_else(|| Error::not_found(format!("version {}", describe(coords))))
    }

    pub fn version_mut(
        &mut self,
        coords: VersionCoordinates<'_>,
    ) -> Result<&mut NativeApplicationVersion> {
        self.platform_mut(coords.name, coords.platform)?
            .version_mut(coords.version)
            .ok_or_else(|| Error::not_found(format!("version {}", describe(coords))))
    }
}

/// `name:platform:version`
pub(crate) fn describe(coords: VersionCoordinates<'_>) -> String {
    format!("{}:{}:{}", coords.name, coords.platform, coords.version)
}

impl Validate for CauldronDocument {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>) {
        let apps = field(path, "nativeApps");
        let mut seen = std::collections::HashSet::new();
        for (i, app) in self.native_apps.iter().enumerate() {
            app.validate_at(&format!("{}[{}]", apps, i), errors);
            if !seen.insert(app.name.as_str()) {
                errors.push(FieldError::new(
                    apps.clone(),
                    format!("duplicate native application '{}'", app.name),
                ));
            }
        }
    }
}

/// Read the document from the working copy at `dir`.
pub fn load(dir: &Path) -> Result<CauldronDocument> {
    let path = dir.join(CAULDRON_DOCUMENT);
    if !path.exists() {
        debug!("[document] {} not found, starting empty", path.display());
        return Ok(CauldronDocument::default());
    }
    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| Error::invalid(CAULDRON_DOCUMENT, e.to_string()))
}

/// Validate `document` and write it to the working copy at `dir`.
pub fn save(dir: &Path, document: &CauldronDocument) -> Result<()> {
    document.validate()?;
    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');
    fs::write(dir.join(CAULDRON_DOCUMENT), content)?;
    Ok(())
}
