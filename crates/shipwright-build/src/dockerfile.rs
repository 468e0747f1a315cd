use crate::BuildError;
use shipwright_catalog::{BuildMethod, BuildPlan};
use shipwright_fetch::Acquisition;
use tera::{Context, Tera};

/// Dockerfile for plans that ship a prebuilt artifact into the image.
const ARTIFACT_TEMPLATE: &str = r#"FROM {{ java_base }}:{{ java_version }}-jre

LABEL org.opencontainers.image.title="{{ service }}" \
      org.opencontainers.image.version="{{ version }}"

ENV SERVICE_NAME="{{ service }}" \
    SERVICE_VERSION="{{ version }}" \
    JAVA_OPTS="{{ java_opts }}"

WORKDIR /opt/{{ service }}
COPY {{ artifact_file }} /opt/{{ service }}/{{ artifact_file }}

EXPOSE 8080
CMD ["sh", "-c", "exec java $JAVA_OPTS -jar /opt/{{ service }}/{{ artifact_file }}"]
"#;

/// Dockerfile for plans built from a source checkout inside the
/// container. The clone happens at image build time, so the context
/// carries nothing but this file.
const SOURCE_TEMPLATE: &str = r#"FROM {{ java_base }}:{{ java_version }}-jdk AS build

RUN apt-get update \
    && apt-get install -y --no-install-recommends git \
    && rm -rf /var/lib/apt/lists/*

RUN git clone --depth 1 --branch {{ branch }} {{ repository }} /src
WORKDIR /src
RUN ./gradlew assemble --no-daemon

FROM {{ java_base }}:{{ java_version }}-jre

LABEL org.opencontainers.image.title="{{ service }}" \
      org.opencontainers.image.version="{{ version }}"

ENV SERVICE_NAME="{{ service }}" \
    SERVICE_VERSION="{{ version }}" \
    JAVA_OPTS="{{ java_opts }}"

COPY --from=build /src/build/libs/ /opt/{{ service }}/

EXPOSE 8080
CMD ["sh", "-c", "exec java $JAVA_OPTS -jar /opt/{{ service }}/*.{{ extension }}"]
"#;

/// Render the Dockerfile for a completed plan.
///
/// Returns `None` for custom-Dockerfile plans, whose file is copied
/// verbatim into the context instead of being rendered.
pub fn render_dockerfile(
    plan: &BuildPlan,
    acquisition: &Acquisition,
) -> Result<Option<String>, BuildError> {
    if plan.method == BuildMethod::CustomDockerfile {
        return Ok(None);
    }
    let java_version = plan
        .java_version
        .as_deref()
        .ok_or_else(|| BuildError::MissingJavaVersion(plan.service.clone()))?;

    let mut ctx = Context::new();
    ctx.insert("service", &plan.service);
    ctx.insert("version", &plan.version);
    ctx.insert("java_version", java_version);
    ctx.insert("java_base", &plan.java_base);
    ctx.insert("java_opts", &plan.java_opts());
    ctx.insert("extension", &plan.extension);

    let template = match acquisition {
        Acquisition::Artifact { file_name, .. } => {
            ctx.insert("artifact_file", file_name);
            ARTIFACT_TEMPLATE
        }
        Acquisition::Source { repository, branch } => {
            ctx.insert("repository", repository);
            ctx.insert("branch", branch);
            SOURCE_TEMPLATE
        }
        Acquisition::CustomDockerfile => return Ok(None),
    };

    let rendered = Tera::one_off(template, &ctx, false)?;
    Ok(Some(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan(method: BuildMethod) -> BuildPlan {
        BuildPlan {
            service: "collectory".to_owned(),
            version: "3.2".to_owned(),
            method,
            artifact: "collectory".to_owned(),
            group: "au.org.ala".to_owned(),
            extension: "war".to_owned(),
            classifier: None,
            registry: "example.test".to_owned(),
            push: false,
            repository: Some("https://github.com/example/collectory".to_owned()),
            branch: Some("develop".to_owned()),
            url: None,
            java_version: Some("11".to_owned()),
            java_base: "eclipse-temurin".to_owned(),
            extra_params: vec![shipwright_catalog::ExtraParam {
                key: "profile".to_owned(),
                value: "docker".to_owned(),
            }],
            dockerfile: None,
            repo_base: "https://nexus.example".to_owned(),
            family: "collectory".to_owned(),
        }
    }

    #[test]
    fn artifact_plan_renders_copy_and_opts() {
        let acquisition = Acquisition::Artifact {
            path: PathBuf::from("/tmp/collectory-3.2.war"),
            file_name: "collectory-3.2.war".to_owned(),
            cache_hit: false,
            bytes: 0,
        };
        let rendered = render_dockerfile(&plan(BuildMethod::Nexus), &acquisition)
            .unwrap()
            .unwrap();
        assert!(rendered.starts_with("FROM eclipse-temurin:11-jre"));
        assert!(rendered.contains("COPY collectory-3.2.war /opt/collectory/collectory-3.2.war"));
        assert!(rendered.contains("JAVA_OPTS=\"-Dprofile=docker\""));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn source_plan_renders_clone_stage() {
        let acquisition = Acquisition::Source {
            repository: "https://github.com/example/collectory".to_owned(),
            branch: "develop".to_owned(),
        };
        let rendered = render_dockerfile(&plan(BuildMethod::RepoBranch), &acquisition)
            .unwrap()
            .unwrap();
        assert!(rendered
            .contains("git clone --depth 1 --branch develop https://github.com/example/collectory /src"));
        assert!(rendered.contains("FROM eclipse-temurin:11-jdk AS build"));
    }

    #[test]
    fn custom_dockerfile_plan_renders_nothing() {
        let rendered =
            render_dockerfile(&plan(BuildMethod::CustomDockerfile), &Acquisition::CustomDockerfile)
                .unwrap();
        assert!(rendered.is_none());
    }

    #[test]
    fn missing_java_version_is_an_error() {
        let mut p = plan(BuildMethod::Nexus);
        p.java_version = None;
        let acquisition = Acquisition::Artifact {
            path: PathBuf::from("/tmp/x.war"),
            file_name: "x.war".to_owned(),
            cache_hit: false,
            bytes: 0,
        };
        assert!(matches!(
            render_dockerfile(&p, &acquisition),
            Err(BuildError::MissingJavaVersion(_))
        ));
    }
}
