use crate::BuildError;
use std::fs;
use std::path::{Path, PathBuf};

/// A per-service build context directory under the build root.
///
/// Preparation always starts from an empty directory; leftovers from a
/// previous run are removed so a context only ever contains what the
/// current plan put there.
pub struct BuildContext {
    path: PathBuf,
}

impl BuildContext {
    pub fn prepare(build_root: &Path, service: &str) -> Result<Self, BuildError> {
        let path = build_root.join(service);
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        tracing::debug!("prepared build context at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dockerfile_path(&self) -> PathBuf {
        self.path.join("Dockerfile")
    }

    pub fn write_dockerfile(&self, content: &str) -> Result<(), BuildError> {
        fs::write(self.dockerfile_path(), content)?;
        Ok(())
    }

    /// Copy a service-provided Dockerfile into the context verbatim.
    pub fn install_dockerfile(&self, source: &Path) -> Result<(), BuildError> {
        fs::copy(source, self.dockerfile_path())?;
        Ok(())
    }
}
