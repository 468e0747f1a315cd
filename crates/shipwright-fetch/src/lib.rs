//! Artifact acquisition for build plans.
//!
//! Depending on the plan's build method this crate downloads the
//! artifact from the Nexus repository (through a local content cache
//! keyed by artifact file name), fetches a direct URL uncached, or
//! reports a source checkout reference for in-container builds.
//! Downloads are staged through temporary files, so an interrupted
//! transfer never leaves a partial cache entry.

pub mod acquire;
pub mod cache;
pub mod nexus;

pub use acquire::{Acquirer, Acquisition};
pub use cache::ArtifactCache;
pub use nexus::{ArtifactCoords, Channel};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed from {url}: {detail}")]
    Download { url: String, detail: String },
    #[error("artifact not found at {0}")]
    NotFound(String),
    #[error("artifact cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no versions listed in repository metadata at {0}")]
    NoVersions(String),
    #[error("build plan for '{0}' carries no source URL")]
    MissingUrl(String),
    #[error("acquisition produced no file at {0}")]
    MissingOutput(std::path::PathBuf),
}
