//! Blob storage.
//!
//! The portal talks to its object store only through [`BlobStore`]. Two
//! implementations ship with the crate: [`LocalBlobStore`] keeps each blob
//! as a file in one directory, [`MemoryBlobStore`] keeps them in process
//! memory.

mod local;
mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::{PortalError, Result};

/// Metadata of a stored blob, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Blob key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type.
    pub content_type: String,
}

/// A blob's bytes plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    /// Raw bytes.
    pub content: Vec<u8>,
    /// Content type.
    pub content_type: String,
}

/// Object storage collaborator.
///
/// All failures surface as [`PortalError::Backend`] with the store's own
/// message.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under `key`. Fails if the key already exists.
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<()>;

    /// Read a blob.
    async fn get(&self, key: &str) -> Result<BlobObject>;

    /// List blobs whose key starts with `prefix`, at most `limit` entries.
    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<BlobEntry>>;

    /// Remove a blob. Fails if the key does not exist.
    async fn delete(&self, key: &str) -> Result<()>;

    /// URL under which clients can download the blob.
    fn public_url(&self, key: &str) -> String;
}

/// Open the blob store selected by the configuration.
pub fn open_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalBlobStore::new(
            &config.path,
            &config.public_base_url,
        )?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryBlobStore::new(&config.public_base_url))),
    }
}

/// Reject keys that could escape a flat namespace.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.chars().any(|c| c.is_control())
    {
        return Err(PortalError::Backend(format!("invalid object key: {key:?}")));
    }
    Ok(())
}

/// Build the public download URL for a key under `base`.
///
/// `base` is expected to end with `/`.
pub(crate) fn blob_url(base: &str, key: &str) -> String {
    format!("{base}blobs/{}", urlencoding::encode(key))
}

/// Normalize a public base URL so that it ends with `/`.
pub(crate) fn normalize_base_url(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}
