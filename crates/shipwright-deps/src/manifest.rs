use crate::version::Constraint;
use crate::DepsError;
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// One version-range rule within a family: a constraint over service
/// versions and the Java runtime they require.
#[derive(Debug, Clone)]
pub struct RuntimeRule {
    pub constraint: Constraint,
    /// The constraint exactly as written in the manifest, for messages.
    pub raw_constraint: String,
    pub java: String,
}

/// The parsed dependency manifest.
///
/// The document maps family keys to a mapping of version constraints
/// to requirement lists; a requirement entry carrying a `java` key
/// supplies the runtime version. Rule order within a family is the
/// document order and is semantically significant, so families hold
/// rules as ordered lists rather than maps.
///
/// Entries that do not fit this shape are skipped with a warning.
/// The whole document being malformed is an error; individual odd
/// entries are not, since the manifest is externally owned and
/// carries sections this tool does not consume.
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    families: Vec<(String, Vec<RuntimeRule>)>,
}

impl DependencyManifest {
    pub fn parse_str(input: &str) -> Result<Self, DepsError> {
        let doc: Value = serde_yaml::from_str(input)?;
        let Value::Mapping(root) = doc else {
            return Ok(Self::default());
        };

        let mut families = Vec::new();
        for (key, value) in &root {
            let Some(family) = key.as_str() else { continue };
            let Value::Mapping(rules_map) = value else {
                continue;
            };
            let mut rules = Vec::new();
            for (raw_constraint, requirements) in rules_map {
                let Some(raw_constraint) = scalar_string(raw_constraint) else {
                    continue;
                };
                let Value::Sequence(entries) = requirements else {
                    continue;
                };
                let Some(java) = java_requirement(entries) else {
                    continue;
                };
                match raw_constraint.parse::<Constraint>() {
                    Ok(constraint) => rules.push(RuntimeRule {
                        constraint,
                        raw_constraint,
                        java,
                    }),
                    Err(_) => {
                        tracing::warn!(
                            "skipping unparseable constraint '{raw_constraint}' in family '{family}'"
                        );
                    }
                }
            }
            families.push((family.to_owned(), rules));
        }
        Ok(Self { families })
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, DepsError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Look up a family's rules, trying the key as given and then its
    /// `-`/`_` spelling variants. Manifest authors are not consistent
    /// about separators.
    pub fn family(&self, key: &str) -> Option<&[RuntimeRule]> {
        let dashed = key.replace('_', "-");
        let underscored = key.replace('-', "_");
        for candidate in [key, dashed.as_str(), underscored.as_str()] {
            if let Some((_, rules)) = self.families.iter().find(|(k, _)| k == candidate) {
                return Some(rules);
            }
        }
        None
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|(k, _)| k.as_str())
    }
}

/// First `java` value found in a requirement list, stringified.
fn java_requirement(entries: &[Value]) -> Option<String> {
    for entry in entries {
        if let Value::Mapping(map) = entry {
            if let Some(java) = map.get("java") {
                if let Some(s) = scalar_string(java) {
                    return Some(s);
                }
            }
        }
    }
    None
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
collectory:
  ">= 3.0 < 4.0":
    - java: 11
    - tomcat: 9
  "*":
    - java: 17
ala-bie:
  "<2.0":
    - java: 8
  ">=2.0":
    - java: 11
species_lists:
  "*":
    - java: 11
"#;

    #[test]
    fn parses_families_and_rule_order() {
        let manifest = DependencyManifest::parse_str(SAMPLE).unwrap();
        let rules = manifest.family("collectory").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].raw_constraint, ">= 3.0 < 4.0");
        assert_eq!(rules[0].java, "11");
        assert_eq!(rules[1].raw_constraint, "*");
        assert_eq!(rules[1].java, "17");
    }

    #[test]
    fn numeric_java_values_are_stringified() {
        let manifest = DependencyManifest::parse_str(SAMPLE).unwrap();
        let rules = manifest.family("ala-bie").unwrap();
        assert_eq!(rules[0].java, "8");
    }

    #[test]
    fn family_lookup_tries_separator_variants() {
        let manifest = DependencyManifest::parse_str(SAMPLE).unwrap();
        assert!(manifest.family("species_lists").is_some());
        assert!(manifest.family("species-lists").is_some());
        assert!(manifest.family("no-such-family").is_none());
    }

    #[test]
    fn entries_without_java_are_skipped() {
        let manifest = DependencyManifest::parse_str(
            "svc:\n  \"*\":\n    - tomcat: 9\n  \"<1.0\":\n    - java: 8\n",
        )
        .unwrap();
        let rules = manifest.family("svc").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].java, "8");
    }

    #[test]
    fn empty_document_is_empty_manifest() {
        let manifest = DependencyManifest::parse_str("").unwrap();
        assert_eq!(manifest.family_names().count(), 0);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(DependencyManifest::parse_str("a: [unclosed").is_err());
    }
}
