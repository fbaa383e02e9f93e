//! # Cauldron Schema
//!
//! This module defines the typed records persisted in a Cauldron and the
//! validator every write goes through.
//!
//! ## Records
//!
//! ```text
//! NativeApplication (name)
//! └── NativeApplicationPlatform (name ∈ {android, ios})
//!     └── NativeApplicationVersion (name, ernPlatformVersion, isReleased,
//!                                   binary, nativeDeps, miniApps,
//!                                   containerVersion)
//! ```
//!
//! Every level may also carry a free-form `config` object, looked up with
//! version → platform → application fallback.
//!
//! ## Defaults and validation
//!
//! Optional fields default on deserialization (`isReleased = false`, empty
//! lists, `binary = null`). Required string fields deserialize to an empty
//! string when missing so that the validator, rather than serde, reports
//! them, with the path of the offending field. Platform names are kept as
//! strings in the records for the same reason and checked against
//! [`Platform`].

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dependency::Dependency;
use crate::error::{Error, FieldError, Result};

/// Mobile platforms a native application can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(Error::invalid(
                "platform",
                format!("'{}' must be one of android, ios", other),
            )),
        }
    }
}

/// Mini-apps of a native application version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiniApps {
    /// Mini-apps baked into the shipped container.
    #[serde(default)]
    pub container: Vec<Dependency>,
    /// Batches of mini-apps delivered over the air, oldest first.
    #[serde(default)]
    pub ota: Vec<Vec<Dependency>>,
}

/// One version of a native application on one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeApplicationVersion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ern_platform_version: String,
    #[serde(default)]
    pub is_released: bool,
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub native_deps: Vec<Dependency>,
    #[serde(default)]
    pub mini_apps: MiniApps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl NativeApplicationVersion {
    /// A new, unreleased version with no dependencies or mini-apps.
    pub fn new(name: impl Into<String>, ern_platform_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ern_platform_version: ern_platform_version.into(),
            ..Default::default()
        }
    }
}

/// A platform entry of a native application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeApplicationPlatform {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub versions: Vec<NativeApplicationVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl NativeApplicationPlatform {
    pub fn new(platform: Platform) -> Self {
        Self {
            name: platform.to_string(),
            ..Default::default()
        }
    }

    pub fn version(&self, name: &str) -> Option<&NativeApplicationVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn version_mut(&mut self, name: &str) -> Option<&mut NativeApplicationVersion> {
        self.versions.iter_mut().find(|v| v.name == name)
    }
}

/// A native application and its platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeApplication {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platforms: Vec<NativeApplicationPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl NativeApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn platform(&self, platform: Platform) -> Option<&NativeApplicationPlatform> {
        self.platforms.iter().find(|p| p.name == platform.as_str())
    }

    pub fn platform_mut(&mut self, platform: Platform) -> Option<&mut NativeApplicationPlatform> {
        self.platforms
            .iter_mut()
            .find(|p| p.name == platform.as_str())
    }
}

/// Fields of a version that may change after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_released: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_version: Option<String>,
}

impl VersionPatch {
    pub fn apply(&self, version: &mut NativeApplicationVersion) {
        if let Some(is_released) = self.is_released {
            version.is_released = is_released;
        }
        if let Some(container_version) = &self.container_version {
            version.container_version = Some(container_version.clone());
        }
    }
}

/// Structural validation of a record.
///
/// Implementations push one `FieldError` per violation, prefixing field
/// names with `path`.
pub trait Validate {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>);

    /// Validate the record as a document root.
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        self.validate_at("", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors })
        }
    }
}

/// `parent.child`, or `child` at the root.
pub(crate) fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn require_name(path: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field(path, "name"), "is required"));
    } else if value.contains(':') {
        errors.push(FieldError::new(
            field(path, "name"),
            format!("'{}' must not contain ':'", value),
        ));
    } else if !is_path_segment(value) {
        errors.push(FieldError::new(
            field(path, "name"),
            format!("'{}' must not contain '/' or '\\', nor be '.' or '..'", value),
        ));
    }
}

/// Names become directories of the blob stores.
pub(crate) fn is_path_segment(value: &str) -> bool {
    if value.contains('/') || value.contains('\\') {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Container versions are plain `x.y.z`.
pub fn validate_container_version(version: &str) -> Result<()> {
    let mut errors = Vec::new();
    check_container_version("", version, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { errors })
    }
}

fn check_container_version(path: &str, version: &str, errors: &mut Vec<FieldError>) {
    let valid = semver::Version::parse(version)
        .map(|v| v.pre.is_empty() && v.build.is_empty())
        .unwrap_or(false);
    if !valid {
        errors.push(FieldError::new(
            field(path, "containerVersion"),
            format!("'{}' is not a valid version of the form x.y.z", version),
        ));
    }
}

fn check_unique<'a>(
    path: &str,
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    errors: &mut Vec<FieldError>,
) {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(FieldError::new(
                path.to_string(),
                format!("duplicate {} '{}'", kind, name),
            ));
        }
    }
}

impl Validate for NativeApplicationVersion {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>) {
        require_name(path, &self.name, errors);
        if self.ern_platform_version.trim().is_empty() {
            errors.push(FieldError::new(
                field(path, "ernPlatformVersion"),
                "is required",
            ));
        }
        if let Some(container_version) = &self.container_version {
            check_container_version(path, container_version, errors);
        }
        for (i, batch) in self.mini_apps.ota.iter().enumerate() {
            if batch.is_empty() {
                errors.push(FieldError::new(
                    format!("{}[{}]", field(path, "miniApps.ota"), i),
                    "must contain at least one mini-app",
                ));
            }
        }
        if let Some(config) = &self.config {
            check_config(path, config, errors);
        }
    }
}

impl Validate for NativeApplicationPlatform {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>) {
        if self.name.parse::<Platform>().is_err() {
            errors.push(FieldError::new(
                field(path, "name"),
                format!("'{}' must be one of android, ios", self.name),
            ));
        }
        let versions = field(path, "versions");
        for (i, version) in self.versions.iter().enumerate() {
            version.validate_at(&format!("{}[{}]", versions, i), errors);
        }
        check_unique(
            &versions,
            "version",
            self.versions.iter().map(|v| v.name.as_str()),
            errors,
        );
        if let Some(config) = &self.config {
            check_config(path, config, errors);
        }
    }
}

impl Validate for NativeApplication {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>) {
        require_name(path, &self.name, errors);
        let platforms = field(path, "platforms");
        for (i, platform) in self.platforms.iter().enumerate() {
            platform.validate_at(&format!("{}[{}]", platforms, i), errors);
        }
        check_unique(
            &platforms,
            "platform",
            self.platforms.iter().map(|p| p.name.as_str()),
            errors,
        );
        if let Some(config) = &self.config {
            check_config(path, config, errors);
        }
    }
}

impl Validate for VersionPatch {
    fn validate_at(&self, path: &str, errors: &mut Vec<FieldError>) {
        if let Some(container_version) = &self.container_version {
            check_container_version(path, container_version, errors);
        }
    }
}

fn check_config(path: &str, config: &Value, errors: &mut Vec<FieldError>) {
    if !config.is_object() {
        errors.push(FieldError::new(field(path, "config"), "must be an object"));
    }
}

/// Deserialize a candidate record from JSON and validate it.
///
/// Type mismatches are reported as validation errors too, so callers get
/// one error kind for every malformed document.
pub fn from_json<T>(value: Value) -> Result<T>
where
    T: Validate + serde::de::DeserializeOwned,
{
    let record: T = serde_json::from_value(value).map_err(|e| Error::invalid("document", e.to_string()))?;
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_names(err: Error) -> Vec<String> {
        match err {
            Error::Validation { errors } => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_platform_parse_and_display() {
        assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert_eq!(Platform::Ios.to_string(), "ios");
        assert!("windows".parse::<Platform>().is_err());
        assert!("Android".parse::<Platform>().is_err());
    }

    #[test]
    fn test_version_defaults_are_filled() {
        let version: NativeApplicationVersion =
            from_json(json!({"name": "1.0.0", "ernPlatformVersion": "10"})).unwrap();
        assert!(!version.is_released);
        assert_eq!(version.binary, None);
        assert!(version.native_deps.is_empty());
        assert!(version.mini_apps.container.is_empty());
        assert!(version.mini_apps.ota.is_empty());
        assert_eq!(version.container_version, None);
    }

    #[test]
    fn test_version_missing_required_fields() {
        let err = from_json::<NativeApplicationVersion>(json!({})).unwrap_err();
        assert_eq!(field_names(err), vec!["name", "ernPlatformVersion"]);
    }

    #[test]
    fn test_version_wrong_type_is_validation_error() {
        let err =
            from_json::<NativeApplicationVersion>(json!({"name": "1.0.0", "isReleased": "yes"}))
                .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_version_invalid_dependency_string() {
        let err = from_json::<NativeApplicationVersion>(json!({
            "name": "1.0.0",
            "ernPlatformVersion": "10",
            "nativeDeps": ["bad@"]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_version_invalid_container_version() {
        let mut version = NativeApplicationVersion::new("1.0.0", "10");
        version.container_version = Some("1.0".to_string());
        let err = version.validate().unwrap_err();
        assert_eq!(field_names(err), vec!["containerVersion"]);

        version.container_version = Some("1.0.1".to_string());
        version.validate().unwrap();
    }

    #[test]
    fn test_version_empty_ota_batch_rejected() {
        let mut version = NativeApplicationVersion::new("1.0.0", "10");
        version.mini_apps.ota.push(vec![]);
        let err = version.validate().unwrap_err();
        assert_eq!(field_names(err), vec!["miniApps.ota[0]"]);
    }

    #[test]
    fn test_platform_name_outside_enum() {
        let err = from_json::<NativeApplicationPlatform>(json!({"name": "windows"})).unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
    }

    #[test]
    fn test_nested_errors_carry_paths() {
        let app = NativeApplication {
            name: "MyApp".to_string(),
            platforms: vec![NativeApplicationPlatform {
                name: "android".to_string(),
                versions: vec![NativeApplicationVersion::new("1.0.0", "")],
                config: None,
            }],
            config: None,
        };
        let err = app.validate().unwrap_err();
        assert_eq!(
            field_names(err),
            vec!["platforms[0].versions[0].ernPlatformVersion"]
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut app = NativeApplication::new("MyApp");
        let mut android = NativeApplicationPlatform::new(Platform::Android);
        android.versions.push(NativeApplicationVersion::new("1.0.0", "10"));
        android.versions.push(NativeApplicationVersion::new("1.0.0", "10"));
        app.platforms.push(android);
        app.platforms.push(NativeApplicationPlatform::new(Platform::Android));

        let err = app.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate version '1.0.0'"));
        assert!(message.contains("duplicate platform 'android'"));
    }

    #[test]
    fn test_name_with_colon_rejected() {
        let err = NativeApplication::new("My:App").validate().unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
    }

    #[test]
    fn test_names_must_be_single_path_segments() {
        for name in ["../escaped", "a/b", "a\\b", ".", "..", "../../../../escaped"] {
            let err = NativeApplicationVersion::new(name, "10")
                .validate()
                .unwrap_err();
            assert_eq!(field_names(err), vec!["name"], "{name}");
        }
        let err = NativeApplication::new("..").validate().unwrap_err();
        assert_eq!(field_names(err), vec!["name"]);
        assert!(NativeApplicationVersion::new("1.0.0-beta.1", "10")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_config_must_be_object() {
        let mut app = NativeApplication::new("MyApp");
        app.config = Some(json!("not an object"));
        let err = app.validate().unwrap_err();
        assert_eq!(field_names(err), vec!["config"]);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let mut version = NativeApplicationVersion::new("1.0.0", "10");
        version.native_deps.push("react-native@0.40.0".parse().unwrap());
        let value = serde_json::to_value(&version).unwrap();
        assert_eq!(value["ernPlatformVersion"], "10");
        assert_eq!(value["isReleased"], false);
        assert_eq!(value["binary"], Value::Null);
        assert_eq!(value["nativeDeps"], json!(["react-native@0.40.0"]));
        assert_eq!(value["miniApps"], json!({"container": [], "ota": []}));
        assert!(value.get("containerVersion").is_none());
    }

    #[test]
    fn test_version_patch_apply() {
        let mut version = NativeApplicationVersion::new("1.0.0", "10");
        VersionPatch {
            is_released: Some(true),
            container_version: Some("1.0.1".to_string()),
        }
        .apply(&mut version);
        assert!(version.is_released);
        assert_eq!(version.container_version.as_deref(), Some("1.0.1"));

        VersionPatch::default().apply(&mut version);
        assert!(version.is_released);
    }

    #[test]
    fn test_validate_container_version() {
        validate_container_version("2.3.4").unwrap();
        assert!(validate_container_version("2.3").is_err());
        assert!(validate_container_version("2.3.4-beta").is_err());
        assert!(validate_container_version("auto").is_err());
    }
}
