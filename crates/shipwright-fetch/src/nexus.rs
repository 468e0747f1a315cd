use shipwright_catalog::BuildPlan;
use shipwright_deps::Version;

/// Repository channel an artifact version publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Release,
    Snapshot,
}

impl Channel {
    /// Any version carrying the snapshot marker goes to the snapshot
    /// channel; everything else is a release.
    #[must_use]
    pub fn for_version(version: &str) -> Self {
        if version.contains("SNAPSHOT") {
            Channel::Snapshot
        } else {
            Channel::Release
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Channel::Release => "releases",
            Channel::Snapshot => "snapshots",
        }
    }
}

/// Fully qualified Maven coordinates of a plan's artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoords {
    pub repo_base: String,
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl ArtifactCoords {
    #[must_use]
    pub fn from_plan(plan: &BuildPlan) -> Self {
        Self {
            repo_base: plan.repo_base.clone(),
            group: plan.group.clone(),
            artifact: plan.artifact.clone(),
            version: plan.version.clone(),
            classifier: plan.classifier.clone(),
            extension: plan.extension.clone(),
        }
    }

    /// `{artifact}-{version}[-{classifier}].{extension}`. Also the
    /// artifact cache key.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut name = format!("{}-{}", self.artifact, self.version);
        if let Some(ref classifier) = self.classifier {
            name.push('-');
            name.push_str(classifier);
        }
        name.push('.');
        name.push_str(&self.extension);
        name
    }

    fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }

    /// Download URL on the channel the version belongs to.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}",
            self.repo_base,
            Channel::for_version(&self.version).path(),
            self.group_path(),
            self.artifact,
            self.version,
            self.file_name()
        )
    }

    /// URL of the artifact's `maven-metadata.xml` on the release channel.
    #[must_use]
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}/{}/{}/maven-metadata.xml",
            self.repo_base,
            Channel::Release.path(),
            self.group_path(),
            self.artifact
        )
    }
}

/// The newest `n` release versions from a `maven-metadata.xml` document,
/// newest first. Snapshot entries and versions that do not parse are
/// skipped.
#[must_use]
pub fn latest_versions(metadata_xml: &str, n: usize) -> Vec<String> {
    let mut versions: Vec<(Version, String)> = Vec::new();
    let mut rest = metadata_xml;
    while let Some(start) = rest.find("<version>") {
        rest = &rest[start + "<version>".len()..];
        let Some(end) = rest.find("</version>") else { break };
        let raw = rest[..end].trim();
        rest = &rest[end + "</version>".len()..];
        if raw.contains("SNAPSHOT") {
            continue;
        }
        if let Ok(parsed) = raw.parse::<Version>() {
            versions.push((parsed, raw.to_owned()));
        }
    }
    versions.sort_by(|a, b| b.0.cmp(&a.0));
    versions.into_iter().take(n).map(|(_, raw)| raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(version: &str, classifier: Option<&str>) -> ArtifactCoords {
        ArtifactCoords {
            repo_base: "https://nexus.ala.org.au/repository".to_owned(),
            group: "au.org.ala".to_owned(),
            artifact: "collectory".to_owned(),
            version: version.to_owned(),
            classifier: classifier.map(str::to_owned),
            extension: "war".to_owned(),
        }
    }

    #[test]
    fn release_channel_url() {
        let url = coords("3.2", None).url();
        assert_eq!(
            url,
            "https://nexus.ala.org.au/repository/releases/au/org/ala/collectory/3.2/collectory-3.2.war"
        );
    }

    #[test]
    fn snapshot_marker_selects_snapshot_channel() {
        let url = coords("3.3-SNAPSHOT", None).url();
        assert!(url.contains("/snapshots/"));
        assert!(url.ends_with("collectory-3.3-SNAPSHOT.war"));
        assert_eq!(Channel::for_version("3.2"), Channel::Release);
        assert_eq!(Channel::for_version("3.3-SNAPSHOT"), Channel::Snapshot);
    }

    #[test]
    fn classifier_lands_between_version_and_extension() {
        assert_eq!(
            coords("1.0", Some("exec")).file_name(),
            "collectory-1.0-exec.war"
        );
    }

    #[test]
    fn metadata_url_is_on_release_channel() {
        let url = coords("3.3-SNAPSHOT", None).metadata_url();
        assert_eq!(
            url,
            "https://nexus.ala.org.au/repository/releases/au/org/ala/collectory/maven-metadata.xml"
        );
    }

    #[test]
    fn latest_versions_sorted_newest_first() {
        let xml = r#"
<metadata>
  <versioning>
    <versions>
      <version>1.9</version>
      <version>1.10</version>
      <version>2.0-SNAPSHOT</version>
      <version>1.2</version>
    </versions>
  </versioning>
</metadata>
"#;
        assert_eq!(latest_versions(xml, 2), vec!["1.10", "1.9"]);
        assert_eq!(latest_versions(xml, 10), vec!["1.10", "1.9", "1.2"]);
    }

    #[test]
    fn latest_versions_empty_metadata() {
        assert!(latest_versions("<metadata/>", 3).is_empty());
    }
}
