mod commands;
mod signal;

use clap::Parser;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use shipwright_catalog::BuildMethod;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shipwright",
    version,
    about = "Container image builder for the Living Atlases service catalogue"
)]
struct Cli {
    /// Service to build (repeatable).
    #[arg(long = "service", value_name = "NAME")]
    services: Vec<String>,

    /// Build every service in the catalogue.
    #[arg(long)]
    all: bool,

    /// Build the services listed in a YAML or JSON file.
    #[arg(long, value_name = "FILE")]
    from_file: Option<PathBuf>,

    /// Skip a service after selection (repeatable).
    #[arg(long = "skip-service", value_name = "NAME")]
    skip: Vec<String>,

    /// Force a specific version/tag for the build.
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Build multiple versions (comma-separated).
    #[arg(long, value_name = "TAGS")]
    list_tags: Option<String>,

    /// Build the newest N release versions from the artifact repository.
    #[arg(long, default_value_t = 1, value_name = "N")]
    n_tags: usize,

    /// Override the Java version (8, 11, 17, 21); skips manifest resolution.
    #[arg(long, value_name = "VER")]
    java_version: Option<String>,

    /// Override the base Java image (e.g. eclipse-temurin).
    #[arg(long, value_name = "IMAGE")]
    java_base: Option<String>,

    /// Force a build method: nexus, url, repo-branch, or custom-dockerfile.
    #[arg(long, value_name = "METHOD")]
    build_method: Option<BuildMethod>,

    /// Override the image registry.
    #[arg(long, value_name = "REGISTRY")]
    registry: Option<String>,

    /// Override the git repository URL (for repo-branch builds).
    #[arg(long = "repo", value_name = "URL")]
    repository: Option<String>,

    /// Override the git branch (for repo-branch builds).
    #[arg(long, value_name = "BRANCH")]
    branch: Option<String>,

    /// Push images to the registry after a successful build.
    #[arg(long)]
    push: bool,

    /// Generate Dockerfiles in the build directory but do not build images.
    #[arg(long)]
    dry_run: bool,

    /// Do not use the engine's layer cache when building.
    #[arg(long)]
    no_cache: bool,

    /// Always attempt to pull newer base images.
    #[arg(long)]
    pull: bool,

    /// Include builder images when selecting with --all.
    #[arg(long)]
    build_builders: bool,

    /// Verify artifact availability instead of building.
    #[arg(long)]
    check: bool,

    /// Path to the service catalogue.
    #[arg(long, default_value = "services.toml", value_name = "FILE")]
    defs: String,

    /// Path to the local build config overrides.
    #[arg(long, default_value = "build-config.toml", value_name = "FILE")]
    config: String,

    /// URL or local path of the dependency manifest.
    #[arg(long, value_name = "URL_OR_FILE")]
    dependencies: Option<String>,

    /// Directory for the artifact and manifest caches.
    #[arg(long, default_value = "~/.cache/shipwright", value_name = "DIR")]
    cache_dir: String,

    /// Directory where build contexts are assembled.
    #[arg(long, default_value = "build", value_name = "DIR")]
    build_dir: String,

    /// Directory holding per-service custom Dockerfiles.
    #[arg(long, default_value = "services", value_name = "DIR")]
    services_dir: String,

    /// Output results as structured JSON.
    #[arg(long)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SHIPWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    signal::install_signal_handler();

    let options = commands::Options {
        services: cli.services,
        all: cli.all,
        from_file: cli.from_file,
        skip: cli.skip,
        tag: cli.tag,
        list_tags: cli.list_tags,
        n_tags: cli.n_tags,
        java_version: cli.java_version,
        java_base: cli.java_base,
        build_method: cli.build_method,
        registry: cli.registry,
        repository: cli.repository,
        branch: cli.branch,
        push: cli.push,
        dry_run: cli.dry_run,
        no_cache: cli.no_cache,
        pull: cli.pull,
        build_builders: cli.build_builders,
        defs: PathBuf::from(cli.defs),
        config: PathBuf::from(cli.config),
        dependencies: cli.dependencies,
        cache_dir: expand_tilde(&cli.cache_dir),
        build_dir: PathBuf::from(cli.build_dir),
        services_dir: PathBuf::from(cli.services_dir),
        json: cli.json,
    };

    let result = if cli.check {
        commands::check::run(&options)
    } else {
        commands::build::run(&options)
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
