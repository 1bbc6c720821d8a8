//! Blob storage for uploaded files
//!
//! Blobs land on the local filesystem under the configured uploads
//! directory, each named with a fresh UUID prefix so that uploads of the
//! same filename never collide. The returned URL is the path the HTTP
//! layer serves the directory at.

use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

/// URL prefix the uploads directory is served under
pub const PUBLIC_PREFIX: &str = "/uploads";

/// A blob written to disk
#[derive(Debug)]
pub struct StoredBlob {
    /// Disk name, UUID-prefixed and sanitized
    pub filename: String,
    /// Public URL of the blob
    pub url: String,
}

/// Filesystem-backed blob store
#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the uploads directory if it does not exist
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create uploads directory {:?}", self.root))
    }

    /// Write `bytes` under a collision-free name derived from `filename`
    pub async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredBlob> {
        let safe = sanitize_filename::sanitize(filename);
        let disk_name = format!("{}-{}", Uuid::new_v4(), safe);

        let path = self.root.join(&disk_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {path:?}"))?;

        tracing::debug!(name = %disk_name, size = bytes.len(), "blob stored");
        Ok(StoredBlob {
            url: format!("{PUBLIC_PREFIX}/{disk_name}"),
            filename: disk_name,
        })
    }

    /// Remove a stored blob by its disk name; missing blobs are not an error
    pub async fn remove(&self, filename: &str) -> Result<()> {
        let path = self.root.join(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove upload {path:?}")),
        }
    }
}
