use crate::manifest::DependencyManifest;
use crate::{DepsError, MANIFEST_TTL};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

/// Fetches the dependency manifest over HTTP and caches the raw
/// document on disk.
///
/// Freshness is judged by file age: a cached copy younger than the
/// time-to-live is used without touching the network. A stale copy is
/// never served as a fallback; if the refetch fails, manifest-dependent
/// operations fail with it. The cache file is written atomically, so a
/// torn download never leaves a partial document behind.
pub struct ManifestCache {
    agent: ureq::Agent,
    url: String,
    cache_dir: PathBuf,
    ttl: Duration,
}

impl ManifestCache {
    pub fn new(url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            url: url.into(),
            cache_dir: cache_dir.into(),
            ttl: MANIFEST_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cache_file(&self) -> PathBuf {
        self.cache_dir.join("dependencies.yaml")
    }

    /// Obtain the manifest.
    ///
    /// With an override source the given local file is parsed directly,
    /// every call, bypassing both network and cache. Otherwise the
    /// cached copy is used while fresh and refetched once it ages out.
    pub fn get(&self, override_source: Option<&Path>) -> Result<DependencyManifest, DepsError> {
        if let Some(path) = override_source {
            tracing::debug!("loading dependency manifest from {}", path.display());
            return DependencyManifest::parse_file(path);
        }

        let cache_file = self.cache_file();
        if let Some(age) = file_age(&cache_file) {
            if age <= self.ttl {
                tracing::debug!("dependency manifest cache hit: {}", cache_file.display());
                match DependencyManifest::parse_file(&cache_file) {
                    Ok(manifest) => return Ok(manifest),
                    Err(e) => {
                        // A corrupt cache entry is treated as absent.
                        tracing::warn!("discarding unreadable manifest cache: {e}");
                    }
                }
            } else {
                tracing::debug!("dependency manifest cache is stale, refetching");
            }
        }

        let body = self.fetch()?;
        let manifest = DependencyManifest::parse_str(&body)?;
        if let Err(e) = self.store(&body) {
            tracing::warn!("could not persist manifest cache: {e}");
        }
        Ok(manifest)
    }

    /// Fetch and parse the manifest from the configured URL, bypassing
    /// the on-disk cache in both directions: no cached copy is read,
    /// and the response is not persisted. For explicitly requested
    /// manifest sources that must be honored verbatim on every run.
    pub fn fetch_uncached(&self) -> Result<DependencyManifest, DepsError> {
        let body = self.fetch()?;
        DependencyManifest::parse_str(&body)
    }

    fn fetch(&self) -> Result<String, DepsError> {
        tracing::info!("fetching dependency manifest from {}", self.url);
        let resp = match self.agent.get(&self.url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => {
                return Err(DepsError::ManifestUnavailable {
                    source_url: self.url.clone(),
                    detail: format!("HTTP {code}"),
                });
            }
            Err(e) => {
                return Err(DepsError::ManifestUnavailable {
                    source_url: self.url.clone(),
                    detail: e.to_string(),
                });
            }
        };
        let mut body = String::new();
        resp.into_body()
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| DepsError::ManifestUnavailable {
                source_url: self.url.clone(),
                detail: e.to_string(),
            })?;
        Ok(body)
    }

    fn store(&self, body: &str) -> Result<(), DepsError> {
        fs::create_dir_all(&self.cache_dir)?;
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.cache_file())
            .map_err(|e| DepsError::Io(e.error))?;
        fsync_dir(&self.cache_dir)?;
        Ok(())
    }
}

fn file_age(path: &Path) -> Option<Duration> {
    let modified = path.metadata().ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}
