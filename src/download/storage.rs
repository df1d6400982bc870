//! Local directory that receives downloaded files.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::DownloadError;
use crate::config::default_storage_root;

/// Handle to the directory downloads are written under.
///
/// The handle is passed to each [`super::Downloader`] explicitly; nothing in
/// the crate holds a global storage path. The directory is shared by every
/// download using the handle, and each download only ever adds a new file
/// under a generated name, so no locking is needed beyond [`StorageRoot::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `downloads` under the platform temp directory.
    ///
    /// Files here are transient; relocating them to durable storage is up to
    /// the caller.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(default_storage_root())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of `file_name` directly under the root.
    #[must_use]
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }

    /// Creates the directory and any missing parents.
    ///
    /// Safe to call repeatedly and concurrently: an existing directory is
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Provisioning`] if the directory cannot be
    /// created or the path exists but is not a directory.
    pub async fn ensure(&self) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|e| DownloadError::provisioning(&self.path, e))?;
        debug!(path = %self.path.display(), "storage root ready");
        Ok(())
    }
}

impl Default for StorageRoot {
    fn default() -> Self {
        Self::ephemeral()
    }
}
