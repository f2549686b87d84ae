//! Deployment identity parsing and resolution

use std::fmt;

use crate::errors::ConfigError;

/// Version token addressing every live version of a base name
pub const ALL_VERSIONS: &str = "all";

/// The `name` or `name/version` string addressing a deployment resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    name: String,
    version: Option<String>,
}

impl DeploymentIdentity {
    /// Parse the canonical textual form, splitting on the first `/`
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (name, version) = match raw.split_once('/') {
            Some((name, version)) => (name, Some(version)),
            None => (raw, None),
        };

        if name.is_empty() || version.is_some_and(str::is_empty) {
            return Err(ConfigError::InvalidIdentity(raw.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }

    /// Parse `raw` and merge in a version supplied separately (e.g. via a
    /// `VERSION` config override). Either source may fill the gap;
    /// conflicting values are an error.
    pub fn resolve(raw: &str, explicit: Option<&str>) -> Result<Self, ConfigError> {
        let mut identity = Self::parse(raw)?;

        match (identity.version.as_deref(), explicit) {
            (Some(from_name), Some(explicit)) if from_name != explicit => {
                Err(ConfigError::AmbiguousVersion {
                    name: identity.name,
                    from_name: from_name.to_string(),
                    explicit: explicit.to_string(),
                })
            }
            (None, Some(explicit)) => {
                identity.version = Some(explicit.to_string());
                Ok(identity)
            }
            _ => Ok(identity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Whether this identity addresses every live version of the base name
    pub fn is_all_versions(&self) -> bool {
        self.version.as_deref() == Some(ALL_VERSIONS)
    }

    /// Same base name, pinned to the given version
    pub fn with_version(&self, version: &str) -> Self {
        Self {
            name: self.name.clone(),
            version: Some(version.to_string()),
        }
    }
}

impl fmt::Display for DeploymentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
