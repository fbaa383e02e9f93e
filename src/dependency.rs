//! Dependency descriptors.
//!
//! A dependency (native plugin or mini-app) is identified by an optional npm
//! scope, a name, and an optional version, written `[@scope/]name[@version]`.
//! Two dependencies are the *same package* when scope and name match,
//! whatever their versions.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEPENDENCY_PATTERN: &str = r"^(?:@([^/@\s]+)/)?([^/@\s]+)(?:@([^/@\s]+))?$";

/// `{ scope?, name, version? }`, canonically written `[@scope/]name[@version]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dependency {
    pub scope: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scope: None,
            name: name.into(),
            version: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Same package, version stripped.
    pub fn without_version(&self) -> Self {
        Self {
            version: None,
            ..self.clone()
        }
    }

    /// `[@scope/]name`
    pub fn package(&self) -> String {
        match &self.scope {
            Some(scope) => format!("@{}/{}", scope, self.name),
            None => self.name.clone(),
        }
    }

    /// True when both refer to the same package (scope and name), regardless
    /// of version.
    pub fn same_package(&self, other: &Dependency) -> bool {
        self.scope == other.scope && self.name == other.name
    }
}

impl FromStr for Dependency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let regex = Regex::new(DEPENDENCY_PATTERN).map_err(Error::Regex)?;
        let captures = regex.captures(s.trim()).ok_or_else(|| {
            Error::invalid(
                "dependency",
                format!("'{}' is not of the form [@scope/]name[@version]", s),
            )
        })?;

        Ok(Self {
            scope: captures.get(1).map(|m| m.as_str().to_string()),
            name: captures[2].to_string(),
            version: captures.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package())?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Dependency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Dependency> for String {
    fn from(dependency: Dependency) -> Self {
        dependency.to_string()
    }
}
