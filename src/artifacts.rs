//! Artifact Store
//!
//! Filesystem half of the resume lifecycle: binary uploads land in a single
//! local directory under names derived from the owning row's id. Writes that
//! must not outlive a failed row commit go through `ArtifactGuard`, which
//! removes the file on drop unless the caller commits.

use crate::error::ApiError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    base_url: String,
}

impl ArtifactStore {
    /// Creates the upload directory if needed.
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            base_url: base_url.into(),
        })
    }

    /// `{id}_{original-upload-name}`, with the upload name reduced to its
    /// final path component first.
    pub fn artifact_name(&self, id: &str, original: &str) -> String {
        let base = Path::new(original)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload");
        format!("{}_{}", id, base)
    }

    /// Retrieval locator for an artifact name.
    pub fn url_for(&self, name: &str) -> String {
        format!(
            "{}/resumes/download/{}",
            self.base_url.trim_end_matches('/'),
            name
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dir.join(name).exists()
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<(), ApiError> {
        fs::write(self.dir.join(name), bytes)?;
        Ok(())
    }

    /// Write with scoped cleanup: the returned guard deletes the file on drop
    /// unless `commit` is called after the owning row is durably stored.
    pub fn write_guarded(&self, name: &str, bytes: &[u8]) -> Result<ArtifactGuard<'_>, ApiError> {
        self.write(name, bytes)?;
        Ok(ArtifactGuard {
            store: self,
            name: name.to_string(),
            committed: false,
        })
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, ApiError> {
        // Names embedding path components never resolve to an artifact.
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Idempotent removal: a missing file is not an error.
    pub fn remove(&self, name: &str) -> std::io::Result<()> {
        let path = self.dir.join(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Deletes the written artifact on drop unless committed.
pub struct ArtifactGuard<'a> {
    store: &'a ArtifactStore,
    name: String,
    committed: bool,
}

impl ArtifactGuard<'_> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ArtifactGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = self.store.remove(&self.name) {
            log::warn!("failed to clean up uncommitted artifact {}: {}", self.name, err);
        }
    }
}
