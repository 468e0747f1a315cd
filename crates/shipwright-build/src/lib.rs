//! The build side of a plan: rendering a Dockerfile, assembling the
//! build context directory, and driving the container engine.

pub mod builder;
pub mod context;
pub mod dockerfile;

pub use builder::{BuildRequest, BuilderCall, ContainerBuilder, DockerCli, MockBuilder};
pub use context::BuildContext;
pub use dockerfile::render_dockerfile;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to render Dockerfile: {0}")]
    Template(#[from] tera::Error),
    #[error("build context I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("'{program}' exited with {status}")]
    CommandFailed { program: String, status: String },
    #[error("container engine '{0}' is not available")]
    EngineUnavailable(String),
    #[error("plan for '{0}' has no resolved Java version")]
    MissingJavaVersion(String),
}
