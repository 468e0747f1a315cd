use crate::plan::BuildMethod;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One entry of the static service catalogue.
///
/// Only `name` is mandatory; every other field is a default that lower
/// layers fall through to. `family` maps the service onto the dependency
/// manifest's key space, since a service name does not necessarily equal its
/// manifest lookup key (e.g. `image-service` resolves under `images`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Maven artifact id; defaults to the service name.
    #[serde(default)]
    pub artifact: Option<String>,
    /// Dotted group id; defaults to the catalogue-wide group.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub method: Option<BuildMethod>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    /// Builder images are build-stage bases, excluded from `--all`
    /// unless explicitly requested.
    #[serde(default)]
    pub builder: bool,
}

/// Catalogue-wide defaults, one precedence layer above the built-ins.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CatalogueDefaults {
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub repo_base: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub method: Option<BuildMethod>,
    #[serde(default)]
    pub java_base: Option<String>,
}

/// The static service catalogue. Services are an ordered array of tables;
/// the document order defines the `--all` build order.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    #[serde(default)]
    pub defaults: CatalogueDefaults,
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceDefinition>,
}

impl Catalogue {
    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Service names in catalogue order.
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for svc in &self.services {
            if svc.name.is_empty() {
                return Err(ConfigError::EmptyServiceName);
            }
            if !seen.insert(svc.name.as_str()) {
                return Err(ConfigError::DuplicateService(svc.name.clone()));
            }
        }
        Ok(())
    }
}

pub fn parse_catalogue_str(input: &str) -> Result<Catalogue, ConfigError> {
    let catalogue: Catalogue = toml::from_str(input)?;
    catalogue.validate()?;
    Ok(catalogue)
}

pub fn parse_catalogue_file(path: impl AsRef<Path>) -> Result<Catalogue, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_catalogue_str(&content)
}
