//! Service catalogue, override layers, and build-plan resolution.
//!
//! This crate owns the configuration side of Shipwright: the static service
//! catalogue (`services.toml`), the optional per-user override file, the
//! `BuildPlan` produced by merging both with CLI flags, and the resolution
//! engine that performs the merge with strict per-field precedence.

pub mod overrides;
pub mod plan;
pub mod resolve;
pub mod service;

pub use overrides::{OverrideEntry, OverrideFile};
pub use plan::{BuildMethod, BuildPlan, CliOverrides, ExtraParam};
pub use resolve::{resolve_plans, Selection};
pub use service::{parse_catalogue_file, parse_catalogue_str, Catalogue, ServiceDefinition};

use thiserror::Error;

/// Built-in defaults, applied when no configuration layer sets the field.
pub const DEFAULT_REGISTRY: &str = "hub.docker.com/u/livingatlases";
pub const DEFAULT_REPO_BASE: &str = "https://nexus.ala.org.au/repository";
pub const DEFAULT_GROUP: &str = "au.org.ala";
pub const DEFAULT_EXTENSION: &str = "war";
pub const DEFAULT_VERSION: &str = "latest";
pub const DEFAULT_JAVA_BASE: &str = "eclipse-temurin";
pub const DEFAULT_BRANCH: &str = "master";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("service '{0}' is not defined in the catalogue")]
    UnknownService(String),
    #[error("service '{0}' is defined more than once in the catalogue")]
    DuplicateService(String),
    #[error("catalogue entry with an empty service name")]
    EmptyServiceName,
    #[error("service '{service}': build method '{method}' requires '{field}' to be set")]
    MissingField {
        service: String,
        method: plan::BuildMethod,
        field: &'static str,
    },
    #[error("service '{service}': custom Dockerfile not found at {path}")]
    DockerfileNotFound { service: String, path: String },
    #[error("unknown build method '{0}', expected nexus, url, repo-branch, or custom-dockerfile")]
    UnknownMethod(String),
}
