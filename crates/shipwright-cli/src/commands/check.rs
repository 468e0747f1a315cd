use super::select::{resolved_plans, versions_for, ManifestSource};
use super::{json_pretty, Options, EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_SUCCESS};
use console::Style;
use shipwright_fetch::{Acquirer, ArtifactCache};

#[derive(Debug, serde::Serialize)]
struct CheckResult {
    service: String,
    version: String,
    java_version: Option<String>,
    url: Option<String>,
    ok: bool,
    detail: Option<String>,
}

/// Verify that every selected plan could be built: configuration
/// resolves, the runtime version is determinable, and the artifact URL
/// answers. Nothing is downloaded or built.
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
    let mut results: Vec<CheckResult> = Vec::new();

    for (name, plan) in plans {
        let plan = match plan {
            Ok(p) => p,
            Err(e) => {
                results.push(CheckResult {
                    service: name,
                    version: String::new(),
                    java_version: None,
                    url: None,
                    ok: false,
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };
        let versions = match versions_for(opts, &acquirer, &plan) {
            Ok(v) => v,
            Err(e) => {
                results.push(CheckResult {
                    service: name,
                    version: String::new(),
                    java_version: None,
                    url: None,
                    ok: false,
                    detail: Some(e),
                });
                continue;
            }
        };

        for version in versions {
            results.push(check_one(&acquirer, &mut manifest, &plan, &name, &version));
        }
    }

    let failed = results.iter().filter(|r| !r.ok).count();
    if opts.json {
        println!("{}", json_pretty(&results)?);
    } else {
        print_table(&results);
    }
    if failed == 0 {
        return Ok(EXIT_SUCCESS);
    }
    // Manifest unavailability gets its own exit code when it is the
    // only thing that failed.
    let all_manifest = results.iter().filter(|r| !r.ok).all(|r| {
        r.detail
            .as_deref()
            .is_some_and(|d| d.starts_with("manifest error:"))
    });
    if all_manifest {
        Ok(EXIT_MANIFEST_ERROR)
    } else {
        Ok(EXIT_FAILURE)
    }
}

fn check_one(
    acquirer: &Acquirer,
    manifest: &mut ManifestSource,
    plan: &shipwright_catalog::BuildPlan,
    name: &str,
    version: &str,
) -> CheckResult {
    let plan = shipwright_catalog::BuildPlan {
        version: version.to_owned(),
        ..plan.clone()
    };

    let java_version = if plan.needs_runtime_resolution() {
        match manifest.java_for(&plan, version) {
            Ok(java) => Some(java),
            Err(e) => {
                return CheckResult {
                    service: name.to_owned(),
                    version: version.to_owned(),
                    java_version: None,
                    url: None,
                    ok: false,
                    detail: Some(e),
                };
            }
        }
    } else {
        plan.java_version.clone()
    };

    match acquirer.check(&plan) {
        Ok(Some((url, reachable))) => CheckResult {
            service: name.to_owned(),
            version: version.to_owned(),
            java_version,
            url: Some(url),
            ok: reachable,
            detail: if reachable {
                None
            } else {
                Some("artifact not reachable".to_owned())
            },
        },
        // Source and custom-Dockerfile plans have no URL to verify.
        Ok(None) => CheckResult {
            service: name.to_owned(),
            version: version.to_owned(),
            java_version,
            url: None,
            ok: true,
            detail: None,
        },
        Err(e) => CheckResult {
            service: name.to_owned(),
            version: version.to_owned(),
            java_version,
            url: None,
            ok: false,
            detail: Some(e.to_string()),
        },
    }
}

fn print_table(results: &[CheckResult]) {
    let green = Style::new().green();
    let red = Style::new().red();
    for result in results {
        let icon = if result.ok {
            green.apply_to("✓").to_string()
        } else {
            red.apply_to("✗").to_string()
        };
        let java = result.java_version.as_deref().unwrap_or("-");
        let location = result
            .url
            .as_deref()
            .or(result.detail.as_deref())
            .unwrap_or("no download needed");
        println!(
            "{icon} {:<28} {:<12} java {:<3} {location}",
            result.service, result.version, java
        );
    }
}
