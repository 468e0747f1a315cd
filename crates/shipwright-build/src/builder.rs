use crate::BuildError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// One container image build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub image: String,
    pub context: PathBuf,
    pub no_cache: bool,
    pub pull: bool,
    pub build_args: Vec<(String, String)>,
}

/// Container engine seam. The orchestrator only ever talks to this
/// trait, so tests and dry runs swap in [`MockBuilder`].
pub trait ContainerBuilder: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    fn build(&self, request: &BuildRequest) -> Result<(), BuildError>;

    fn push(&self, image: &str) -> Result<(), BuildError>;
}

/// Drives the `docker` command line.
pub struct DockerCli;

impl DockerCli {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), BuildError> {
        let mut cmd = Command::new("docker");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!("running docker {}", args.join(" "));
        let status = cmd.status().map_err(|e| BuildError::CommandFailed {
            program: "docker".to_owned(),
            status: e.to_string(),
        })?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                program: "docker".to_owned(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl ContainerBuilder for DockerCli {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn available(&self) -> bool {
        Command::new("docker")
            .arg("version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn build(&self, request: &BuildRequest) -> Result<(), BuildError> {
        let mut args: Vec<String> = vec!["build".to_owned(), "-t".to_owned(), request.image.clone()];
        for (key, value) in &request.build_args {
            args.push("--build-arg".to_owned());
            args.push(format!("{key}={value}"));
        }
        if request.no_cache {
            args.push("--no-cache".to_owned());
        }
        if request.pull {
            args.push("--pull".to_owned());
        }
        args.push(".".to_owned());
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&arg_refs, Some(request.context.as_path()))
    }

    fn push(&self, image: &str) -> Result<(), BuildError> {
        self.run(&["push", image], None)
    }
}

/// Records every call instead of touching a container engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderCall {
    Build(BuildRequest),
    Push(String),
}

#[derive(Default)]
pub struct MockBuilder {
    calls: Mutex<Vec<BuilderCall>>,
    fail_builds: bool,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder whose every build invocation fails, for error paths.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_builds: true,
        }
    }

    pub fn calls(&self) -> Vec<BuilderCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContainerBuilder for MockBuilder {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn build(&self, request: &BuildRequest) -> Result<(), BuildError> {
        self.calls
            .lock()
            .unwrap()
            .push(BuilderCall::Build(request.clone()));
        if self.fail_builds {
            return Err(BuildError::CommandFailed {
                program: "mock".to_owned(),
                status: "simulated failure".to_owned(),
            });
        }
        Ok(())
    }

    fn push(&self, image: &str) -> Result<(), BuildError> {
        self.calls
            .lock()
            .unwrap()
            .push(BuilderCall::Push(image.to_owned()));
        Ok(())
    }
}
