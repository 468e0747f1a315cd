use crate::FetchError;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat on-disk artifact cache keyed by fully qualified artifact file
/// name.
///
/// Entries are immutable once written and never expire: the key
/// embeds the version and classifier, so staleness is resolved by
/// asking for a different key, not by mutating an entry. Writers must
/// go through [`commit`](Self::commit), which renames a fully written
/// staging file into place.
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.path_for(file_name).is_file()
    }

    /// Move a fully downloaded staging file into the cache. Idempotent:
    /// an existing entry is kept and the staging file discarded.
    pub fn commit(&self, file_name: &str, staged: tempfile::NamedTempFile) -> Result<PathBuf, FetchError> {
        fs::create_dir_all(&self.dir)?;
        let dest = self.path_for(file_name);
        if dest.exists() {
            return Ok(dest);
        }
        staged.as_file().sync_all()?;
        staged.persist(&dest).map_err(|e| FetchError::Io(e.error))?;
        fsync_dir(&self.dir)?;
        Ok(dest)
    }

    /// Open a staging file in the cache directory, so the final rename
    /// stays on one filesystem.
    pub fn stage(&self) -> Result<tempfile::NamedTempFile, FetchError> {
        fs::create_dir_all(&self.dir)?;
        Ok(tempfile::NamedTempFile::new_in(&self.dir)?)
    }
}

fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn commit_makes_entry_visible() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());
        assert!(!cache.contains("a-1.0.war"));

        let mut staged = cache.stage().unwrap();
        staged.write_all(b"bytes").unwrap();
        let path = cache.commit("a-1.0.war", staged).unwrap();

        assert!(cache.contains("a-1.0.war"));
        assert_eq!(fs::read(path).unwrap(), b"bytes");
    }

    #[test]
    fn commit_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());

        let mut first = cache.stage().unwrap();
        first.write_all(b"original").unwrap();
        cache.commit("a-1.0.war", first).unwrap();

        let mut second = cache.stage().unwrap();
        second.write_all(b"different").unwrap();
        let path = cache.commit("a-1.0.war", second).unwrap();

        assert_eq!(fs::read(path).unwrap(), b"original");
    }

    #[test]
    fn dropped_staging_file_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());
        {
            let mut staged = cache.stage().unwrap();
            staged.write_all(b"partial").unwrap();
            // Dropped without commit, as an aborted download would be.
        }
        assert!(!cache.contains("a-1.0.war"));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }
}
