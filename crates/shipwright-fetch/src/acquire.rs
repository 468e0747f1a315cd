use crate::cache::ArtifactCache;
use crate::nexus::{latest_versions, ArtifactCoords};
use crate::FetchError;
use shipwright_catalog::{BuildMethod, BuildPlan};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// What acquisition produced for a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// A local artifact file, placed in the build context.
    Artifact {
        path: PathBuf,
        file_name: String,
        cache_hit: bool,
        bytes: u64,
    },
    /// A source checkout reference; the clone happens inside the
    /// container build.
    Source { repository: String, branch: String },
    /// Nothing to acquire, the service ships its own Dockerfile.
    CustomDockerfile,
}

/// Downloads plan artifacts, consulting the artifact cache for
/// repository-coordinate downloads.
pub struct Acquirer {
    agent: ureq::Agent,
    cache: ArtifactCache,
}

impl Acquirer {
    pub fn new(cache: ArtifactCache) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            cache,
        }
    }

    /// Produce the plan's build input inside `context_dir`.
    ///
    /// Nexus artifacts resolve through the cache: a hit copies the
    /// cached bytes without touching the network, a miss downloads,
    /// commits to the cache, then copies. Direct URLs are fetched
    /// uncached on every invocation. Source and custom-Dockerfile
    /// methods perform no network traffic at all.
    pub fn acquire(
        &self,
        plan: &BuildPlan,
        context_dir: &Path,
    ) -> Result<Acquisition, FetchError> {
        match plan.method {
            BuildMethod::CustomDockerfile => Ok(Acquisition::CustomDockerfile),
            BuildMethod::RepoBranch => {
                let repository = plan
                    .repository
                    .clone()
                    .ok_or_else(|| FetchError::MissingUrl(plan.service.clone()))?;
                let branch = plan.branch.clone().unwrap_or_default();
                Ok(Acquisition::Source { repository, branch })
            }
            BuildMethod::Nexus => self.acquire_cached(plan, context_dir),
            BuildMethod::Url => self.fetch_direct(plan, context_dir),
        }
    }

    fn acquire_cached(
        &self,
        plan: &BuildPlan,
        context_dir: &Path,
    ) -> Result<Acquisition, FetchError> {
        let coords = ArtifactCoords::from_plan(plan);
        let file_name = coords.file_name();

        let cache_hit = self.cache.contains(&file_name);
        let cached = if cache_hit {
            tracing::debug!("artifact cache hit: {file_name}");
            self.cache.path_for(&file_name)
        } else {
            let url = coords.url();
            tracing::info!("downloading {url}");
            let staged = self.download(&url, self.cache.stage()?)?;
            self.cache.commit(&file_name, staged)?
        };

        fs::create_dir_all(context_dir)?;
        let dest = context_dir.join(&file_name);
        fs::copy(&cached, &dest)?;
        placed_artifact(dest, file_name, cache_hit)
    }

    /// Direct URLs have no caching layer. Every invocation re-fetches,
    /// and the download never touches the artifact cache, so it cannot
    /// shadow or be shadowed by a Nexus artifact with the same
    /// coordinates.
    fn fetch_direct(
        &self,
        plan: &BuildPlan,
        context_dir: &Path,
    ) -> Result<Acquisition, FetchError> {
        let url = plan
            .url
            .clone()
            .ok_or_else(|| FetchError::MissingUrl(plan.service.clone()))?;
        let file_name = ArtifactCoords::from_plan(plan).file_name();

        fs::create_dir_all(context_dir)?;
        tracing::info!("downloading {url}");
        let staged = self.download(&url, tempfile::NamedTempFile::new_in(context_dir)?)?;
        let dest = context_dir.join(&file_name);
        staged.persist(&dest).map_err(|e| FetchError::Io(e.error))?;
        placed_artifact(dest, file_name, false)
    }

    /// Stream a URL into the given staging file. Any failure drops the
    /// staging file, leaving no trace.
    fn download(
        &self,
        url: &str,
        mut staged: tempfile::NamedTempFile,
    ) -> Result<tempfile::NamedTempFile, FetchError> {
        let resp = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(FetchError::NotFound(url.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(FetchError::Download {
                    url: url.to_owned(),
                    detail: format!("HTTP {code}"),
                });
            }
            Err(e) => {
                return Err(FetchError::Download {
                    url: url.to_owned(),
                    detail: e.to_string(),
                });
            }
        };

        let mut reader = resp.into_body().into_reader();
        std::io::copy(&mut reader, staged.as_file_mut()).map_err(|e| FetchError::Download {
            url: url.to_owned(),
            detail: e.to_string(),
        })?;
        Ok(staged)
    }

    /// Verify the plan's artifact URL answers a HEAD request. Returns
    /// `None` for methods that do not download anything.
    pub fn check(&self, plan: &BuildPlan) -> Result<Option<(String, bool)>, FetchError> {
        let url = match plan.method {
            BuildMethod::Nexus => ArtifactCoords::from_plan(plan).url(),
            BuildMethod::Url => plan
                .url
                .clone()
                .ok_or_else(|| FetchError::MissingUrl(plan.service.clone()))?,
            BuildMethod::RepoBranch | BuildMethod::CustomDockerfile => return Ok(None),
        };
        tracing::debug!("HEAD {url}");
        let reachable = match self.agent.head(&url).call() {
            Ok(resp) => resp.status().as_u16() == 200,
            Err(ureq::Error::StatusCode(_)) => false,
            Err(e) => {
                return Err(FetchError::Download {
                    url,
                    detail: e.to_string(),
                });
            }
        };
        Ok(Some((url, reachable)))
    }

    /// The plan's newest `n` release versions, from the repository's
    /// `maven-metadata.xml`.
    pub fn list_versions(&self, plan: &BuildPlan, n: usize) -> Result<Vec<String>, FetchError> {
        let url = ArtifactCoords::from_plan(plan).metadata_url();
        tracing::debug!("fetching version metadata from {url}");
        let resp = match self.agent.get(&url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => return Err(FetchError::NotFound(url)),
            Err(e) => {
                return Err(FetchError::Download {
                    url,
                    detail: e.to_string(),
                });
            }
        };
        let mut body = String::new();
        resp.into_body()
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| FetchError::Download {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        let versions = latest_versions(&body, n);
        if versions.is_empty() {
            return Err(FetchError::NoVersions(url));
        }
        Ok(versions)
    }
}

/// Confirm the artifact landed in the build context and record its
/// size.
fn placed_artifact(
    dest: PathBuf,
    file_name: String,
    cache_hit: bool,
) -> Result<Acquisition, FetchError> {
    let metadata = fs::metadata(&dest).map_err(|_| FetchError::MissingOutput(dest.clone()))?;
    if !metadata.is_file() {
        return Err(FetchError::MissingOutput(dest));
    }
    let bytes = metadata.len();
    tracing::debug!("{file_name}: {bytes} bytes in build context");
    Ok(Acquisition::Artifact {
        path: dest,
        file_name,
        cache_hit,
        bytes,
    })
}
