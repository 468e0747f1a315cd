use crate::overrides::OverrideFile;
use crate::plan::{BuildMethod, BuildPlan, CliOverrides};
use crate::service::Catalogue;
use crate::{
    ConfigError, DEFAULT_BRANCH, DEFAULT_EXTENSION, DEFAULT_GROUP, DEFAULT_JAVA_BASE,
    DEFAULT_REGISTRY, DEFAULT_REPO_BASE, DEFAULT_VERSION,
};
use std::collections::HashSet;
use std::path::Path;

/// Which services an invocation asked for.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Every catalogue service, in catalogue order. Builder images are
    /// excluded unless requested, and come first when included.
    All { include_builders: bool },
    /// An explicit list, in input order.
    Names(Vec<String>),
}

/// Resolve one build plan per requested service.
///
/// Field merge is strictly last-writer-wins across the ordered layers:
/// built-in default < catalogue `[defaults]` < service definition <
/// override `[defaults]` < override `[services.<name>]` < CLI flag.
///
/// A malformed plan for one service never prevents resolution of the
/// others; each entry carries its own `Result`.
pub fn resolve_plans(
    selection: &Selection,
    skip: &[String],
    catalogue: &Catalogue,
    overrides: &OverrideFile,
    cli: &CliOverrides,
    services_dir: &Path,
) -> Vec<(String, Result<BuildPlan, ConfigError>)> {
    let mut names: Vec<String> = match selection {
        Selection::All { include_builders } => {
            let mut v = Vec::new();
            if *include_builders {
                v.extend(
                    catalogue
                        .services
                        .iter()
                        .filter(|s| s.builder)
                        .map(|s| s.name.clone()),
                );
            }
            v.extend(
                catalogue
                    .services
                    .iter()
                    .filter(|s| !s.builder)
                    .map(|s| s.name.clone()),
            );
            v
        }
        Selection::Names(list) => list.clone(),
    };
    // Skip is applied after full expansion, so `--all` plus a skip list
    // behaves identically to enumerating the remainder by hand.
    names.retain(|n| !skip.iter().any(|s| s == n));
    // A service named twice resolves once, at its first position.
    let mut seen = HashSet::new();
    names.retain(|n| seen.insert(n.clone()));

    names
        .into_iter()
        .map(|name| {
            let plan = resolve_one(&name, catalogue, overrides, cli, services_dir);
            (name, plan)
        })
        .collect()
}

fn resolve_one(
    name: &str,
    catalogue: &Catalogue,
    overrides: &OverrideFile,
    cli: &CliOverrides,
    services_dir: &Path,
) -> Result<BuildPlan, ConfigError> {
    let def = catalogue
        .get(name)
        .ok_or_else(|| ConfigError::UnknownService(name.to_owned()))?;
    let cat = &catalogue.defaults;
    let glob = &overrides.defaults;
    let svc = overrides.for_service(name);

    let version = cli
        .version
        .clone()
        .or_else(|| svc.and_then(|o| o.version.clone()))
        .or_else(|| glob.version.clone())
        .or_else(|| def.version.clone())
        .unwrap_or_else(|| DEFAULT_VERSION.to_owned());

    let mut method = cli
        .method
        .or_else(|| svc.and_then(|o| o.method))
        .or_else(|| glob.method)
        .or(def.method)
        .or(cat.method)
        .unwrap_or(BuildMethod::Nexus);

    let registry = cli
        .registry
        .clone()
        .or_else(|| svc.and_then(|o| o.registry.clone()))
        .or_else(|| glob.registry.clone())
        .or_else(|| def.registry.clone())
        .or_else(|| cat.registry.clone())
        .unwrap_or_else(|| DEFAULT_REGISTRY.to_owned());

    let extension = svc
        .and_then(|o| o.extension.clone())
        .or_else(|| glob.extension.clone())
        .or_else(|| def.extension.clone())
        .or_else(|| cat.extension.clone())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_owned());

    let classifier = svc
        .and_then(|o| o.classifier.clone())
        .or_else(|| glob.classifier.clone())
        .or_else(|| def.classifier.clone());

    let repository = cli
        .repository
        .clone()
        .or_else(|| svc.and_then(|o| o.repository.clone()))
        .or_else(|| glob.repository.clone())
        .or_else(|| def.repository.clone());

    let mut branch = cli
        .branch
        .clone()
        .or_else(|| svc.and_then(|o| o.branch.clone()))
        .or_else(|| glob.branch.clone())
        .or_else(|| def.branch.clone());

    let url = svc
        .and_then(|o| o.url.clone())
        .or_else(|| glob.url.clone());

    let java_version = cli
        .java_version
        .clone()
        .or_else(|| svc.and_then(|o| o.java_version.clone()))
        .or_else(|| glob.java_version.clone());

    let java_base = cli
        .java_base
        .clone()
        .or_else(|| svc.and_then(|o| o.java_base.clone()))
        .or_else(|| glob.java_base.clone())
        .or_else(|| cat.java_base.clone())
        .unwrap_or_else(|| DEFAULT_JAVA_BASE.to_owned());

    let extra_params = svc
        .and_then(|o| o.extra_params.clone())
        .or_else(|| glob.extra_params.clone())
        .unwrap_or_default();

    let push = cli.push || svc.and_then(|o| o.push).or(glob.push).unwrap_or(false);

    // A service-specific Dockerfile on disk selects the sentinel method,
    // unless the operator forced a method on the command line.
    let candidate = services_dir.join(name).join("Dockerfile");
    let mut dockerfile = None;
    if cli.method.is_none() && candidate.is_file() {
        tracing::debug!("using custom Dockerfile for '{name}': {}", candidate.display());
        method = BuildMethod::CustomDockerfile;
        dockerfile = Some(candidate);
    } else if method == BuildMethod::CustomDockerfile {
        if !candidate.is_file() {
            return Err(ConfigError::DockerfileNotFound {
                service: name.to_owned(),
                path: candidate.display().to_string(),
            });
        }
        dockerfile = Some(candidate);
    }

    match method {
        BuildMethod::Url if url.is_none() => {
            return Err(ConfigError::MissingField {
                service: name.to_owned(),
                method,
                field: "url",
            });
        }
        BuildMethod::RepoBranch => {
            if repository.is_none() {
                return Err(ConfigError::MissingField {
                    service: name.to_owned(),
                    method,
                    field: "repository",
                });
            }
            if branch.is_none() {
                branch = Some(DEFAULT_BRANCH.to_owned());
            }
        }
        _ => {}
    }

    Ok(BuildPlan {
        service: name.to_owned(),
        version,
        method,
        artifact: def.artifact.clone().unwrap_or_else(|| name.to_owned()),
        group: def
            .group
            .clone()
            .or_else(|| cat.group.clone())
            .unwrap_or_else(|| DEFAULT_GROUP.to_owned()),
        extension,
        classifier,
        registry,
        push,
        repository,
        branch,
        url,
        java_version,
        java_base,
        extra_params,
        dockerfile,
        repo_base: cat
            .repo_base
            .clone()
            .unwrap_or_else(|| DEFAULT_REPO_BASE.to_owned()),
        family: def.family.clone().unwrap_or_else(|| name.to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::parse_catalogue_str;
    use std::fs;

    fn catalogue() -> Catalogue {
        parse_catalogue_str(
            r#"
[defaults]
registry = "hub.docker.com/u/livingatlases"
group = "au.org.ala"
extension = "war"
method = "nexus"

[[service]]
name = "java-builder"
builder = true

[[service]]
name = "collectory"
version = "3.2"
repository = "https://github.com/AtlasOfLivingAustralia/collectory"

[[service]]
name = "ala-hub"

[[service]]
name = "image-service"
extension = "jar"
family = "images"
"#,
        )
        .unwrap()
    }

    fn resolve_all(
        catalogue: &Catalogue,
        skip: &[String],
        overrides: &OverrideFile,
        cli: &CliOverrides,
    ) -> Vec<(String, Result<BuildPlan, ConfigError>)> {
        let dir = tempfile::tempdir().unwrap();
        resolve_plans(
            &Selection::All {
                include_builders: false,
            },
            skip,
            catalogue,
            overrides,
            cli,
            dir.path(),
        )
    }

    #[test]
    fn all_follows_catalogue_order_without_builders() {
        let cat = catalogue();
        let plans = resolve_all(&cat, &[], &OverrideFile::default(), &CliOverrides::default());
        let names: Vec<&str> = plans.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["collectory", "ala-hub", "image-service"]);
    }

    #[test]
    fn all_with_skip_equals_manual_enumeration() {
        let cat = catalogue();
        let overrides = OverrideFile::default();
        let cli = CliOverrides::default();
        let dir = tempfile::tempdir().unwrap();

        let skipped = resolve_all(&cat, &["ala-hub".to_owned()], &overrides, &cli);
        let manual = resolve_plans(
            &Selection::Names(vec!["collectory".to_owned(), "image-service".to_owned()]),
            &[],
            &cat,
            &overrides,
            &cli,
            dir.path(),
        );

        let a: Vec<_> = skipped.iter().map(|(n, r)| (n, r.as_ref().unwrap())).collect();
        let b: Vec<_> = manual.iter().map(|(n, r)| (n, r.as_ref().unwrap())).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_names_resolve_to_one_plan() {
        let cat = catalogue();
        let dir = tempfile::tempdir().unwrap();
        let plans = resolve_plans(
            &Selection::Names(vec![
                "collectory".to_owned(),
                "ala-hub".to_owned(),
                "collectory".to_owned(),
            ]),
            &[],
            &cat,
            &OverrideFile::default(),
            &CliOverrides::default(),
            dir.path(),
        );
        let names: Vec<&str> = plans.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["collectory", "ala-hub"]);
    }

    #[test]
    fn builders_come_first_when_requested() {
        let cat = catalogue();
        let dir = tempfile::tempdir().unwrap();
        let plans = resolve_plans(
            &Selection::All {
                include_builders: true,
            },
            &[],
            &cat,
            &OverrideFile::default(),
            &CliOverrides::default(),
            dir.path(),
        );
        assert_eq!(plans[0].0, "java-builder");
        assert_eq!(plans.len(), 4);
    }

    #[test]
    fn catalogue_defaults_fill_unset_fields() {
        let cat = catalogue();
        let plans = resolve_all(&cat, &[], &OverrideFile::default(), &CliOverrides::default());
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.registry, "hub.docker.com/u/livingatlases");
        assert_eq!(plan.extension, "war");
        assert_eq!(plan.method, BuildMethod::Nexus);
        assert_eq!(plan.group, "au.org.ala");
        assert_eq!(plan.version, "3.2");
        assert_eq!(plan.artifact, "collectory");
    }

    #[test]
    fn service_definition_beats_catalogue_defaults() {
        let cat = catalogue();
        let plans = resolve_all(&cat, &[], &OverrideFile::default(), &CliOverrides::default());
        let image_service = plans
            .iter()
            .find(|(n, _)| n == "image-service")
            .and_then(|(_, r)| r.as_ref().ok())
            .unwrap();
        assert_eq!(image_service.extension, "jar");
        assert_eq!(image_service.family, "images");
    }

    #[test]
    fn global_override_beats_service_definition() {
        let cat = catalogue();
        let overrides = OverrideFile::parse_str("[defaults]\nversion = \"9.9\"\n").unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        assert_eq!(plans[0].1.as_ref().unwrap().version, "9.9");
    }

    #[test]
    fn service_override_beats_global_override() {
        let cat = catalogue();
        let overrides = OverrideFile::parse_str(
            "[defaults]\nregistry = \"global.example\"\n[services.collectory]\nregistry = \"svc.example\"\n",
        )
        .unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let collectory = plans[0].1.as_ref().unwrap();
        let hub = plans[1].1.as_ref().unwrap();
        assert_eq!(collectory.registry, "svc.example");
        assert_eq!(hub.registry, "global.example");
    }

    #[test]
    fn cli_flag_beats_every_layer() {
        let cat = catalogue();
        let overrides = OverrideFile::parse_str(
            "[defaults]\nregistry = \"global.example\"\n[services.collectory]\nregistry = \"svc.example\"\n",
        )
        .unwrap();
        let cli = CliOverrides {
            registry: Some("cli.example".to_owned()),
            version: Some("1.0".to_owned()),
            ..CliOverrides::default()
        };
        let plans = resolve_all(&cat, &[], &overrides, &cli);
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.registry, "cli.example");
        assert_eq!(plan.version, "1.0");
    }

    #[test]
    fn unknown_service_does_not_poison_others() {
        let cat = catalogue();
        let dir = tempfile::tempdir().unwrap();
        let plans = resolve_plans(
            &Selection::Names(vec!["collectory".to_owned(), "nope".to_owned()]),
            &[],
            &cat,
            &OverrideFile::default(),
            &CliOverrides::default(),
            dir.path(),
        );
        assert!(plans[0].1.is_ok());
        assert!(matches!(
            plans[1].1,
            Err(ConfigError::UnknownService(ref n)) if n == "nope"
        ));
    }

    #[test]
    fn url_method_requires_url() {
        let cat = catalogue();
        let overrides =
            OverrideFile::parse_str("[services.ala-hub]\nmethod = \"url\"\n").unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        assert!(matches!(
            hub.1,
            Err(ConfigError::MissingField { field: "url", .. })
        ));
    }

    #[test]
    fn url_method_with_url_resolves() {
        let cat = catalogue();
        let overrides = OverrideFile::parse_str(
            "[services.ala-hub]\nmethod = \"url\"\nurl = \"https://example.org/hub.war\"\n",
        )
        .unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        let plan = hub.1.as_ref().unwrap();
        assert_eq!(plan.method, BuildMethod::Url);
        assert_eq!(plan.url.as_deref(), Some("https://example.org/hub.war"));
    }

    #[test]
    fn repo_branch_requires_repository() {
        let cat = catalogue();
        let overrides =
            OverrideFile::parse_str("[services.ala-hub]\nmethod = \"repo-branch\"\n").unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        assert!(matches!(
            hub.1,
            Err(ConfigError::MissingField { field: "repository", .. })
        ));
    }

    #[test]
    fn repo_branch_defaults_branch_to_master() {
        let cat = catalogue();
        let overrides =
            OverrideFile::parse_str("[services.collectory]\nmethod = \"repo-branch\"\n").unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.method, BuildMethod::RepoBranch);
        assert_eq!(plan.branch.as_deref(), Some("master"));
        assert!(plan.repository.is_some());
    }

    #[test]
    fn custom_dockerfile_detected_on_disk() {
        let cat = catalogue();
        let dir = tempfile::tempdir().unwrap();
        let svc_dir = dir.path().join("collectory");
        fs::create_dir_all(&svc_dir).unwrap();
        fs::write(svc_dir.join("Dockerfile"), "FROM scratch\n").unwrap();

        let plans = resolve_plans(
            &Selection::Names(vec!["collectory".to_owned()]),
            &[],
            &cat,
            &OverrideFile::default(),
            &CliOverrides::default(),
            dir.path(),
        );
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.method, BuildMethod::CustomDockerfile);
        assert!(plan.dockerfile.as_ref().unwrap().ends_with("collectory/Dockerfile"));
    }

    #[test]
    fn explicit_cli_method_beats_dockerfile_detection() {
        let cat = catalogue();
        let dir = tempfile::tempdir().unwrap();
        let svc_dir = dir.path().join("collectory");
        fs::create_dir_all(&svc_dir).unwrap();
        fs::write(svc_dir.join("Dockerfile"), "FROM scratch\n").unwrap();

        let cli = CliOverrides {
            method: Some(BuildMethod::Nexus),
            ..CliOverrides::default()
        };
        let plans = resolve_plans(
            &Selection::Names(vec!["collectory".to_owned()]),
            &[],
            &cat,
            &OverrideFile::default(),
            &cli,
            dir.path(),
        );
        let plan = plans[0].1.as_ref().unwrap();
        assert_eq!(plan.method, BuildMethod::Nexus);
        assert!(plan.dockerfile.is_none());
    }

    #[test]
    fn configured_custom_method_without_file_fails() {
        let cat = catalogue();
        let overrides =
            OverrideFile::parse_str("[services.ala-hub]\nmethod = \"custom-dockerfile\"\n")
                .unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        assert!(matches!(hub.1, Err(ConfigError::DockerfileNotFound { .. })));
    }

    #[test]
    fn version_defaults_to_latest() {
        let cat = catalogue();
        let plans = resolve_all(&cat, &[], &OverrideFile::default(), &CliOverrides::default());
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        assert_eq!(hub.1.as_ref().unwrap().version, "latest");
    }

    #[test]
    fn push_flag_from_cli_or_layer() {
        let cat = catalogue();
        let cli = CliOverrides {
            push: true,
            ..CliOverrides::default()
        };
        let plans = resolve_all(&cat, &[], &OverrideFile::default(), &cli);
        assert!(plans[0].1.as_ref().unwrap().push);

        let overrides = OverrideFile::parse_str("[services.collectory]\npush = true\n").unwrap();
        let plans = resolve_all(&cat, &[], &overrides, &CliOverrides::default());
        assert!(plans[0].1.as_ref().unwrap().push);
        let hub = plans.iter().find(|(n, _)| n == "ala-hub").unwrap();
        assert!(!hub.1.as_ref().unwrap().push);
    }
}
