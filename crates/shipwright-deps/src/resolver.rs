use crate::manifest::DependencyManifest;
use crate::version::Version;
use crate::DepsError;

/// Floating version labels that resolve against the newest rule set
/// rather than a concrete release.
const FLOATING_VERSIONS: &[&str] = &["latest", "develop"];

/// Resolve the Java runtime version for a service release.
///
/// Rules are evaluated in manifest declaration order and the first
/// match wins; later rules are commonly written as broad catch-alls,
/// so best-match semantics would pick the wrong rule. Floating
/// versions (`latest`, `develop`) track whatever the newest code
/// needs, so they resolve to the highest Java version any rule in the
/// family names.
pub fn resolve_java_version(
    manifest: &DependencyManifest,
    family: &str,
    service_version: &str,
) -> Result<String, DepsError> {
    let rules = manifest
        .family(family)
        .ok_or_else(|| DepsError::UnknownFamily(family.to_owned()))?;

    if FLOATING_VERSIONS.contains(&service_version) || service_version.is_empty() {
        return highest_java(rules).ok_or_else(|| DepsError::NoMatchingRule {
            family: family.to_owned(),
            version: service_version.to_owned(),
        });
    }

    let version: Version = service_version.parse()?;
    for rule in rules {
        if rule.constraint.matches(&version) {
            tracing::debug!(
                "family '{family}' version {service_version}: rule '{}' selects java {}",
                rule.raw_constraint,
                rule.java
            );
            return Ok(rule.java.clone());
        }
    }
    Err(DepsError::NoMatchingRule {
        family: family.to_owned(),
        version: service_version.to_owned(),
    })
}

fn highest_java(rules: &[crate::manifest::RuntimeRule]) -> Option<String> {
    rules
        .iter()
        .max_by_key(|r| r.java.parse::<u32>().unwrap_or(0))
        .map(|r| r.java.clone())
}
