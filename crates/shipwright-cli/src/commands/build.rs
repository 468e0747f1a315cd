use super::select::{resolved_plans, versions_for, ManifestSource};
use super::{
    json_pretty, spin_fail, spin_ok, spinner, Options, EXIT_FAILURE, EXIT_MANIFEST_ERROR,
    EXIT_SUCCESS,
};
use crate::signal::shutdown_requested;
use console::Style;
use shipwright_build::{
    render_dockerfile, BuildContext, BuildRequest, ContainerBuilder, DockerCli,
};
use shipwright_catalog::{BuildMethod, BuildPlan};
use shipwright_fetch::{Acquirer, Acquisition, ArtifactCache};

#[derive(Debug, Clone, serde::Serialize)]
struct Outcome {
    service: String,
    version: String,
    image: Option<String>,
    status: &'static str,
    detail: Option<String>,
}

pub fn run(opts: &Options) -> Result<u8, String> {
    let plans = resolved_plans(opts)?;
    if plans.is_empty() {
        if !opts.json {
            println!("no services selected");
        }
        return Ok(EXIT_SUCCESS);
    }

    let acquirer = Acquirer::new(ArtifactCache::new(opts.cache_dir.join("artifacts")));
    let mut manifest = ManifestSource::new(opts);
    let builder = DockerCli;
    if !opts.dry_run && !builder.available() {
        return Err("container engine 'docker' is not available".to_owned());
    }

    let mut outcomes: Vec<Outcome> = Vec::new();
    'services: for (name, plan) in plans {
        if shutdown_requested() {
            break;
        }
        let plan = match plan {
            Ok(p) => p,
            Err(e) => {
                outcomes.push(Outcome {
                    service: name,
                    version: String::new(),
                    image: None,
                    status: "failed",
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };
        let versions = match versions_for(opts, &acquirer, &plan) {
            Ok(v) => v,
            Err(e) => {
                outcomes.push(Outcome {
                    service: name,
                    version: String::new(),
                    image: None,
                    status: "failed",
                    detail: Some(e),
                });
                continue;
            }
        };

        for version in versions {
            if shutdown_requested() {
                break 'services;
            }
            let pb = if opts.json {
                None
            } else {
                Some(spinner(&format!("{name}:{version}")))
            };
            match build_one(opts, &acquirer, &mut manifest, &builder, &plan, &version) {
                Ok(image) => {
                    if let Some(ref pb) = pb {
                        let verb = if opts.dry_run { "rendered" } else { "built" };
                        spin_ok(pb, &format!("{verb} {image}"));
                    }
                    outcomes.push(Outcome {
                        service: name.clone(),
                        version,
                        image: Some(image),
                        status: if opts.dry_run { "rendered" } else { "built" },
                        detail: None,
                    });
                }
                Err(e) => {
                    if let Some(ref pb) = pb {
                        spin_fail(pb, &format!("{name}:{version} failed"));
                    }
                    tracing::error!("{name}:{version}: {e}");
                    outcomes.push(Outcome {
                        service: name.clone(),
                        version,
                        image: None,
                        status: "failed",
                        detail: Some(e),
                    });
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.status == "failed").count();
    if opts.json {
        println!("{}", json_pretty(&outcomes)?);
    } else {
        print_summary(&outcomes, failed);
    }
    Ok(failure_exit_code(&outcomes, failed))
}

/// Manifest unavailability gets its own exit code when it is the only
/// thing that failed; any other failure mix reports plain failure.
fn failure_exit_code(outcomes: &[Outcome], failed: usize) -> u8 {
    if failed == 0 {
        return EXIT_SUCCESS;
    }
    let all_manifest = outcomes
        .iter()
        .filter(|o| o.status == "failed")
        .all(|o| {
            o.detail
                .as_deref()
                .is_some_and(|d| d.starts_with("manifest error:"))
        });
    if all_manifest {
        EXIT_MANIFEST_ERROR
    } else {
        EXIT_FAILURE
    }
}

/// Run the whole pipeline for one service at one concrete version.
fn build_one(
    opts: &Options,
    acquirer: &Acquirer,
    manifest: &mut ManifestSource,
    builder: &dyn ContainerBuilder,
    plan: &BuildPlan,
    version: &str,
) -> Result<String, String> {
    let plan = BuildPlan {
        version: version.to_owned(),
        ..plan.clone()
    };
    let plan = if plan.needs_runtime_resolution() {
        let java = manifest.java_for(&plan, version)?;
        tracing::debug!("{}: resolved java {java}", plan.service);
        plan.with_java_version(java)
    } else {
        plan
    };

    let context =
        BuildContext::prepare(&opts.build_dir, &plan.service).map_err(|e| e.to_string())?;

    // A dry run renders from coordinates without touching the network.
    let acquisition = if opts.dry_run {
        planned_acquisition(&plan)?
    } else {
        acquirer
            .acquire(&plan, context.path())
            .map_err(|e| e.to_string())?
    };

    match render_dockerfile(&plan, &acquisition).map_err(|e| e.to_string())? {
        Some(content) => context.write_dockerfile(&content).map_err(|e| e.to_string())?,
        None => {
            let dockerfile = plan
                .dockerfile
                .as_ref()
                .ok_or_else(|| format!("'{}' has no custom Dockerfile to install", plan.service))?;
            context
                .install_dockerfile(dockerfile)
                .map_err(|e| e.to_string())?;
        }
    }

    let image = plan.image();
    if opts.dry_run {
        return Ok(image);
    }

    builder
        .build(&BuildRequest {
            image: image.clone(),
            context: context.path().to_owned(),
            no_cache: opts.no_cache,
            pull: opts.pull,
            build_args: vec![
                ("BUILD_METHOD".to_owned(), plan.method.as_str().to_owned()),
                ("VERSION".to_owned(), plan.version.clone()),
            ],
        })
        .map_err(|e| e.to_string())?;

    if plan.push {
        builder.push(&image).map_err(|e| e.to_string())?;
    }
    Ok(image)
}

/// What acquisition would produce, derived from the plan alone.
fn planned_acquisition(plan: &BuildPlan) -> Result<Acquisition, String> {
    match plan.method {
        BuildMethod::CustomDockerfile => Ok(Acquisition::CustomDockerfile),
        BuildMethod::RepoBranch => Ok(Acquisition::Source {
            repository: plan.repository.clone().unwrap_or_default(),
            branch: plan.branch.clone().unwrap_or_default(),
        }),
        BuildMethod::Nexus | BuildMethod::Url => {
            let coords = shipwright_fetch::ArtifactCoords::from_plan(plan);
            let file_name = coords.file_name();
            Ok(Acquisition::Artifact {
                path: file_name.clone().into(),
                file_name,
                cache_hit: false,
                bytes: 0,
            })
        }
    }
}

fn print_summary(outcomes: &[Outcome], failed: usize) {
    let green = Style::new().green();
    let red = Style::new().red();
    println!();
    for outcome in outcomes {
        match outcome.status {
            "failed" => {
                let detail = outcome.detail.as_deref().unwrap_or("unknown failure");
                println!(
                    "{} {}:{} ({detail})",
                    red.apply_to("✗"),
                    outcome.service,
                    outcome.version
                );
            }
            status => {
                let image = outcome.image.as_deref().unwrap_or(&outcome.service);
                println!("{} {image} ({status})", green.apply_to("✓"));
            }
        }
    }
    if failed > 0 {
        println!(
            "\n{} of {} builds failed",
            red.apply_to(failed.to_string()),
            outcomes.len()
        );
    } else {
        println!("\nall {} builds succeeded", outcomes.len());
    }
}
