//! In-memory blob store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::{blob_url, normalize_base_url, validate_key, BlobEntry, BlobObject, BlobStore};
use crate::{PortalError, Result};

/// Blob store holding everything in process memory.
///
/// Listing order is key order. The store can be switched to read-only, in
/// which case `put` and `delete` fail the way a bucket under maintenance
/// would.
#[derive(Debug)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, BlobObject>>,
    public_base_url: String,
    read_only: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            public_base_url: normalize_base_url(public_base_url),
            read_only: AtomicBool::new(false),
        }
    }

    /// Reject (`true`) or accept (`false`) writes and deletes.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a blob exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, BlobObject>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, BlobObject>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(PortalError::Backend("storage is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<()> {
        validate_key(key)?;
        self.check_writable()?;

        let mut objects = self.write();
        if objects.contains_key(key) {
            return Err(PortalError::Backend(format!("object already exists: {key}")));
        }
        objects.insert(
            key.to_string(),
            BlobObject {
                content,
                content_type: if content_type.is_empty() {
                    "application/octet-stream".to_string()
                } else {
                    content_type.to_string()
                },
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobObject> {
        self.read()
            .get(key)
            .cloned()
            .ok_or_else(|| PortalError::Backend(format!("object not found: {key}")))
    }

    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<BlobEntry>> {
        let objects = self.read();
        let entries = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, object)| BlobEntry {
                key: key.clone(),
                size: object.content.len() as u64,
                content_type: object.content_type.clone(),
            })
            .collect();
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;

        self.write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PortalError::Backend(format!("object not found: {key}")))
    }

    fn public_url(&self, key: &str) -> String {
        blob_url(&self.public_base_url, key)
    }
}
