//! Dependency manifest handling and runtime version resolution.
//!
//! The manifest is an externally owned YAML document mapping runtime
//! family keys to ordered lists of version-range rules. This crate
//! fetches it over HTTP with a local time-to-live cache, parses it
//! preserving rule order, and resolves the Java runtime version a
//! given service release must be built against.

pub mod cache;
pub mod manifest;
pub mod resolver;
pub mod version;

pub use cache::ManifestCache;
pub use manifest::{DependencyManifest, RuntimeRule};
pub use resolver::resolve_java_version;
pub use version::{Constraint, Version};

use std::time::Duration;
use thiserror::Error;

/// Where the manifest lives when no override source is given.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/living-atlases/la-toolkit-backend/master/assets/dependencies.yaml";

/// Cached manifests older than this are refetched.
pub const MANIFEST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum DepsError {
    #[error("dependency manifest unavailable from {source_url}: {detail}")]
    ManifestUnavailable { source_url: String, detail: String },
    #[error("runtime family '{0}' is not present in the dependency manifest")]
    UnknownFamily(String),
    #[error("no rule in family '{family}' matches version '{version}'")]
    NoMatchingRule { family: String, version: String },
    #[error("'{0}' is not a valid version string")]
    InvalidVersion(String),
    #[error("manifest cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dependency manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
}
