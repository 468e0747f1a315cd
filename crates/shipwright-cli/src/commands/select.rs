use super::Options;
use shipwright_catalog::{
    parse_catalogue_file, resolve_plans, BuildPlan, Catalogue, ConfigError, OverrideFile, Selection,
};
use shipwright_deps::{resolve_java_version, DependencyManifest, ManifestCache, DEFAULT_MANIFEST_URL};
use shipwright_fetch::Acquirer;
use std::fs;
use std::path::PathBuf;

/// Figure out which services an invocation selects. `None` means
/// nothing was selected, which is a no-op rather than an error.
pub fn selection(opts: &Options) -> Result<Option<Selection>, String> {
    if opts.all {
        return Ok(Some(Selection::All {
            include_builders: opts.build_builders,
        }));
    }
    let mut names = opts.services.clone();
    if let Some(ref path) = opts.from_file {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("config error: failed to read {}: {e}", path.display()))?;
        let listed: Vec<String> = serde_yaml::from_str(&content)
            .map_err(|e| format!("config error: failed to parse {}: {e}", path.display()))?;
        names.extend(listed);
    }
    if names.is_empty() {
        return Ok(None);
    }
    Ok(Some(Selection::Names(names)))
}

/// Parse both configuration documents and run the resolution engine.
pub fn resolved_plans(
    opts: &Options,
) -> Result<Vec<(String, Result<BuildPlan, ConfigError>)>, String> {
    let Some(selection) = selection(opts)? else {
        return Ok(Vec::new());
    };
    let catalogue = load_catalogue(opts)?;
    let overrides = OverrideFile::load_optional(&opts.config)
        .map_err(|e| format!("config error: {}: {e}", opts.config.display()))?;
    Ok(resolve_plans(
        &selection,
        &opts.skip,
        &catalogue,
        &overrides,
        &opts.cli_overrides(),
        &opts.services_dir,
    ))
}

fn load_catalogue(opts: &Options) -> Result<Catalogue, String> {
    parse_catalogue_file(&opts.defs)
        .map_err(|e| format!("config error: {}: {e}", opts.defs.display()))
}

/// The version set a plan expands to: the forced tag, an explicit
/// comma-separated list, the newest N published releases, or just the
/// plan's own resolved version.
pub fn versions_for(
    opts: &Options,
    acquirer: &Acquirer,
    plan: &BuildPlan,
) -> Result<Vec<String>, String> {
    if let Some(ref tag) = opts.tag {
        return Ok(vec![tag.clone()]);
    }
    if let Some(ref tags) = opts.list_tags {
        return Ok(tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect());
    }
    if opts.n_tags > 1 {
        return acquirer
            .list_versions(plan, opts.n_tags)
            .map_err(|e| e.to_string());
    }
    Ok(vec![plan.version.clone()])
}

/// Lazily loaded dependency manifest.
///
/// The manifest is loaded at most once per invocation, and only when
/// some plan actually needs runtime resolution. Explicit override
/// sources are honored verbatim: a local file is read directly and an
/// override URL is fetched uncached, neither reading nor writing the
/// TTL cache the default source uses. A load failure is remembered,
/// so later manifest-dependent plans fail with the same error instead
/// of retrying the source.
pub struct ManifestSource {
    cache: ManifestCache,
    override_path: Option<PathBuf>,
    override_url: bool,
    manifest: Option<Result<DependencyManifest, String>>,
}

impl ManifestSource {
    pub fn new(opts: &Options) -> Self {
        let (url, override_path, override_url) = match opts.dependencies.as_deref() {
            Some(dep) if dep.starts_with("http") => (dep.to_owned(), None, true),
            Some(dep) => (
                DEFAULT_MANIFEST_URL.to_owned(),
                Some(PathBuf::from(dep)),
                false,
            ),
            None => (DEFAULT_MANIFEST_URL.to_owned(), None, false),
        };
        Self {
            cache: ManifestCache::new(url, opts.cache_dir.clone()),
            override_path,
            override_url,
            manifest: None,
        }
    }

    /// Resolve the Java version for one plan at one concrete version.
    ///
    /// A `manifest error:` result means the manifest itself could not
    /// be obtained; any other error is a per-plan resolution failure.
    pub fn java_for(&mut self, plan: &BuildPlan, version: &str) -> Result<String, String> {
        if self.manifest.is_none() {
            let loaded = if self.override_url {
                self.cache.fetch_uncached()
            } else {
                self.cache.get(self.override_path.as_deref())
            };
            self.manifest = Some(loaded.map_err(|e| format!("manifest error: {e}")));
        }
        match self.manifest.as_ref() {
            Some(Ok(manifest)) => {
                resolve_java_version(manifest, &plan.family, version).map_err(|e| e.to_string())
            }
            Some(Err(e)) => Err(e.clone()),
            None => Err("manifest error: manifest not loaded".to_owned()),
        }
    }
}
