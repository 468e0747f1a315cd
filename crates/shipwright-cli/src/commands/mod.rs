pub mod build;
pub mod check;
pub mod select;

use indicatif::{ProgressBar, ProgressStyle};
use shipwright_catalog::{BuildMethod, CliOverrides};
use std::path::PathBuf;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_MANIFEST_ERROR: u8 = 3;

/// Everything the command line resolved to, handed to the commands.
#[derive(Debug, Clone)]
pub struct Options {
    pub services: Vec<String>,
    pub all: bool,
    pub from_file: Option<PathBuf>,
    pub skip: Vec<String>,
    pub tag: Option<String>,
    pub list_tags: Option<String>,
    pub n_tags: usize,
    pub java_version: Option<String>,
    pub java_base: Option<String>,
    pub build_method: Option<BuildMethod>,
    pub registry: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub push: bool,
    pub dry_run: bool,
    pub no_cache: bool,
    pub pull: bool,
    pub build_builders: bool,
    pub defs: PathBuf,
    pub config: PathBuf,
    pub dependencies: Option<String>,
    pub cache_dir: PathBuf,
    pub build_dir: PathBuf,
    pub services_dir: PathBuf,
    pub json: bool,
}

impl Options {
    /// The CLI layer of the configuration merge.
    pub fn cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            version: self.tag.clone(),
            registry: self.registry.clone(),
            method: self.build_method,
            java_version: self.java_version.clone(),
            java_base: self.java_base.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            push: self.push,
        }
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}
