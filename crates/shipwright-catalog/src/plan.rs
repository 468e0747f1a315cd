use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Strategy for obtaining a service's build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMethod {
    /// Download the artifact from the Nexus repository (default).
    Nexus,
    /// Download the artifact from an explicit direct URL.
    Url,
    /// Build from source inside the container (git clone of repository + branch).
    RepoBranch,
    /// Use a service-specific Dockerfile as-is, no acquisition or templating.
    CustomDockerfile,
}

impl BuildMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMethod::Nexus => "nexus",
            BuildMethod::Url => "url",
            BuildMethod::RepoBranch => "repo-branch",
            BuildMethod::CustomDockerfile => "custom-dockerfile",
        }
    }
}

impl fmt::Display for BuildMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nexus" => Ok(BuildMethod::Nexus),
            "url" => Ok(BuildMethod::Url),
            "repo-branch" => Ok(BuildMethod::RepoBranch),
            "custom-dockerfile" => Ok(BuildMethod::CustomDockerfile),
            other => Err(ConfigError::UnknownMethod(other.to_owned())),
        }
    }
}

/// A key/value pair passed through to the container build as a
/// `-Dkey=value` system property. Order is preserved from the
/// configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraParam {
    pub key: String,
    pub value: String,
}

/// Per-field CLI overrides, the highest-precedence configuration layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub version: Option<String>,
    pub registry: Option<String>,
    pub method: Option<BuildMethod>,
    pub java_version: Option<String>,
    pub java_base: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub push: bool,
}

/// The fully resolved, per-service execution unit.
///
/// A plan is immutable after resolution. `java_version` is the one field
/// filled in later: when no configuration layer pinned it, the version
/// resolver supplies it via [`with_java_version`](Self::with_java_version),
/// which produces a new completed plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildPlan {
    pub service: String,
    pub version: String,
    pub method: BuildMethod,
    pub artifact: String,
    pub group: String,
    pub extension: String,
    pub classifier: Option<String>,
    pub registry: String,
    pub push: bool,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub url: Option<String>,
    pub java_version: Option<String>,
    pub java_base: String,
    pub extra_params: Vec<ExtraParam>,
    pub dockerfile: Option<PathBuf>,
    pub repo_base: String,
    /// Manifest family key for runtime-version lookup (catalogue-owned mapping).
    pub family: String,
}

impl BuildPlan {
    /// Full image reference: `{registry}/{service}:{version}`.
    pub fn image(&self) -> String {
        format!("{}/{}:{}", self.registry, self.service, self.version)
    }

    /// Extra params rendered as JVM system-property flags.
    pub fn java_opts(&self) -> String {
        self.extra_params
            .iter()
            .map(|p| format!("-D{}={}", p.key, p.value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the dependency manifest must be consulted to complete this plan.
    pub fn needs_runtime_resolution(&self) -> bool {
        self.java_version.is_none() && self.method != BuildMethod::CustomDockerfile
    }

    pub fn with_java_version(self, java_version: String) -> Self {
        Self {
            java_version: Some(java_version),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> BuildPlan {
        BuildPlan {
            service: "collectory".to_owned(),
            version: "3.2".to_owned(),
            method: BuildMethod::Nexus,
            artifact: "collectory".to_owned(),
            group: "au.org.ala".to_owned(),
            extension: "war".to_owned(),
            classifier: None,
            registry: "hub.docker.com/u/livingatlases".to_owned(),
            push: false,
            repository: None,
            branch: None,
            url: None,
            java_version: None,
            java_base: "eclipse-temurin".to_owned(),
            extra_params: Vec::new(),
            dockerfile: None,
            repo_base: "https://nexus.ala.org.au/repository".to_owned(),
            family: "collectory".to_owned(),
        }
    }

    #[test]
    fn image_reference_format() {
        let plan = sample_plan();
        assert_eq!(plan.image(), "hub.docker.com/u/livingatlases/collectory:3.2");
    }

    #[test]
    fn java_opts_preserve_order() {
        let mut plan = sample_plan();
        plan.extra_params = vec![
            ExtraParam {
                key: "collectory.config".to_owned(),
                value: "/data/config".to_owned(),
            },
            ExtraParam {
                key: "file.encoding".to_owned(),
                value: "UTF-8".to_owned(),
            },
        ];
        assert_eq!(
            plan.java_opts(),
            "-Dcollectory.config=/data/config -Dfile.encoding=UTF-8"
        );
    }

    #[test]
    fn runtime_resolution_skipped_when_pinned() {
        let plan = sample_plan().with_java_version("11".to_owned());
        assert!(!plan.needs_runtime_resolution());
    }

    #[test]
    fn runtime_resolution_skipped_for_custom_dockerfile() {
        let mut plan = sample_plan();
        plan.method = BuildMethod::CustomDockerfile;
        assert!(!plan.needs_runtime_resolution());
    }

    #[test]
    fn with_java_version_preserves_other_fields() {
        let plan = sample_plan().with_java_version("17".to_owned());
        assert_eq!(plan.java_version.as_deref(), Some("17"));
        assert_eq!(plan.service, "collectory");
    }

    #[test]
    fn method_roundtrips_through_str() {
        for method in [
            BuildMethod::Nexus,
            BuildMethod::Url,
            BuildMethod::RepoBranch,
            BuildMethod::CustomDockerfile,
        ] {
            assert_eq!(method.as_str().parse::<BuildMethod>().unwrap(), method);
        }
        assert!("maven".parse::<BuildMethod>().is_err());
    }
}
