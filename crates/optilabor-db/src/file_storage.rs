//! Blob storage for uploaded documents.
//!
//! Uploaded plans are stored content-addressed by BLAKE3 hash, so the same
//! document uploaded twice under different names occupies one blob.
//!
//! ## Example
//!
//! ```rust,ignore
//! use optilabor_db::file_storage::{FilesystemBackend, StorageBackend, store_document};
//!
//! let backend = FilesystemBackend::new("/var/lib/optilabor/files");
//! let stored = store_document(&backend, &data).await?;
//! assert!(backend.exists(&stored.storage_path).await?);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use optilabor_core::{Error, Result};

/// Storage backend trait for different storage implementations.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend.
///
/// Path format: `{base_path}/blobs/{first-2-hex}/{next-2-hex}/{hash}.bin`
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = std::path::Path::new(path);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir)
        });
        if escapes || path.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Storage path must be relative and inside the store: {}",
                path
            )));
        }
        Ok(self.base_path.join(relative))
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch permission errors and
    /// missing directories early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }
}

/// Sibling temp path unique to this write.
///
/// Content-addressed writes of the same document race on the same target, so
/// each writer stages its own file and the final rename decides.
fn temp_path_for(full_path: &Path) -> PathBuf {
    static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let name = full_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blob");
    full_path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(storage_path = %path, size = data.len(), "file_storage: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "file_storage: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = temp_path_for(&full_path);
        if let Err(e) = write_temp(&temp_path, data).await {
            warn!(temp_path = %temp_path.display(), error = %e, "file_storage: temp write failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "file_storage: rename failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}

async fn write_temp(temp_path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    // rw-r--r--, uploads are never executable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp_path, std::fs::Permissions::from_mode(0o644)).await?;
    }
    Ok(())
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Storage path for a content hash produced by [`compute_content_hash`].
///
/// Example: `blobs/9f/86/9f86d081884c7d65....bin`
pub fn storage_path_for_hash(content_hash: &str) -> String {
    let hex = content_hash.strip_prefix("blake3:").unwrap_or(content_hash);
    format!("blobs/{}/{}/{}.bin", &hex[0..2], &hex[2..4], hex)
}

/// A document persisted in blob storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub content_hash: String,
    pub storage_path: String,
    /// False when an identical blob was already present.
    pub newly_written: bool,
    pub size_bytes: usize,
}

/// Store document bytes content-addressed, skipping the write when the blob exists.
pub async fn store_document(backend: &dyn StorageBackend, data: &[u8]) -> Result<StoredDocument> {
    let content_hash = compute_content_hash(data);
    let storage_path = storage_path_for_hash(&content_hash);

    let newly_written = if backend.exists(&storage_path).await? {
        debug!(storage_path = %storage_path, "file_storage: blob already present");
        false
    } else {
        backend.write(&storage_path, data).await?;
        true
    };

    Ok(StoredDocument {
        content_hash,
        storage_path,
        newly_written,
        size_bytes: data.len(),
    })
}
