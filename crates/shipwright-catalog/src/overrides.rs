use crate::plan::{BuildMethod, ExtraParam};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A partial set of fields overriding catalogue defaults.
///
/// Every field is optional: an unset field falls through to the layer
/// below. `extra_params` replaces the lower layer's list wholesale;
/// lists are scalars for merge purposes, never appended to.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OverrideEntry {
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub push: Option<bool>,
    #[serde(default)]
    pub method: Option<BuildMethod>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub java_version: Option<String>,
    #[serde(default)]
    pub java_base: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub extra_params: Option<Vec<ExtraParam>>,
}

/// The user override file: a global `[defaults]` section plus
/// per-service `[services.<name>]` sections.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OverrideFile {
    #[serde(default)]
    pub defaults: OverrideEntry,
    #[serde(default)]
    pub services: BTreeMap<String, OverrideEntry>,
}

impl OverrideFile {
    pub fn parse_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load the override file. An absent file is not an error; it yields
    /// the empty layer.
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("no override file at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    pub fn for_service(&self, name: &str) -> Option<&OverrideEntry> {
        self.services.get(name)
    }
}
