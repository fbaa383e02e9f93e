//! Native application descriptors.
//!
//! A descriptor `{name, platform?, version?}` addresses a node of the Cauldron
//! hierarchy and is written `name[:platform[:version]]`. A descriptor missing
//! its platform or version is *partial*.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::schema::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeApplicationDescriptor {
    pub name: String,
    pub platform: Option<Platform>,
    pub version: Option<String>,
}

/// The three coordinates of a complete descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCoordinates<'a> {
    pub name: &'a str,
    pub platform: Platform,
    pub version: &'a str,
}

impl NativeApplicationDescriptor {
    /// Application-level descriptor.
    pub fn app(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: None,
            version: None,
        }
    }

    /// Platform-level descriptor.
    pub fn platform(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform: Some(platform),
            version: None,
        }
    }

    /// Complete (version-level) descriptor.
    pub fn version(name: impl Into<String>, platform: Platform, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: Some(platform),
            version: Some(version.into()),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.platform.is_none() || self.version.is_none()
    }

    /// Coordinates of a complete descriptor, or `PartialDescriptor`.
    pub fn require_complete(&self) -> Result<VersionCoordinates<'_>> {
        match (self.platform, self.version.as_deref()) {
            (Some(platform), Some(version)) => Ok(VersionCoordinates {
                name: &self.name,
                platform,
                version,
            }),
            _ => Err(Error::PartialDescriptor {
                descriptor: self.to_string(),
            }),
        }
    }

    /// The platform-level descriptor this one belongs to, if any.
    pub fn without_version(&self) -> Self {
        Self {
            version: None,
            ..self.clone()
        }
    }
}

impl FromStr for NativeApplicationDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split(':');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(Error::invalid(
                "descriptor",
                format!("'{}' is missing the application name", s),
            ));
        }

        let platform = match parts.next() {
            Some(platform) => Some(platform.parse::<Platform>()?),
            None => None,
        };
        let version = match parts.next() {
            Some("") => {
                return Err(Error::invalid(
                    "descriptor",
                    format!("'{}' has an empty version", s),
                ))
            }
            Some(version) => Some(version.to_string()),
            None => None,
        };
        if parts.next().is_some() {
            return Err(Error::invalid(
                "descriptor",
                format!("'{}' is not of the form name[:platform[:version]]", s),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            platform,
            version,
        })
    }
}

impl fmt::Display for NativeApplicationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(platform) = self.platform {
            write!(f, ":{}", platform)?;
            if let Some(version) = &self.version {
                write!(f, ":{}", version)?;
            }
        }
        Ok(())
    }
}
