//! Directory-backed blob store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{blob_url, normalize_base_url, validate_key, BlobEntry, BlobObject, BlobStore};
use crate::file::content_type_for;
use crate::{PortalError, Result};

/// Blob store keeping one file per key in a flat directory.
///
/// ```text
/// {base_path}/
/// ├── .meta/
/// │   ├── carol_1700000000000_notes.txt   (content type)
/// │   └── dave_1700000001234_photo.png
/// ├── carol_1700000000000_notes.txt
/// └── dave_1700000001234_photo.png
/// ```
///
/// The content type given to `put` is kept in `.meta/`. Blobs without one
/// fall back to a guess from the key's extension.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

/// Directory holding the content type of each blob.
const META_DIR: &str = ".meta";

fn backend_error(action: &str, key: &str, e: io::Error) -> PortalError {
    PortalError::Backend(format!("failed to {action} object {key}: {e}"))
}

impl LocalBlobStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: &str) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(base_path.join(META_DIR))?;

        Ok(Self {
            base_path,
            public_base_url: normalize_base_url(public_base_url),
        })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.base_path.join(META_DIR).join(key)
    }

    async fn content_type(&self, key: &str) -> String {
        match fs::read_to_string(self.meta_path(key)).await {
            Ok(content_type) if !content_type.trim().is_empty() => {
                content_type.trim().to_string()
            }
            _ => content_type_for(key),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(PortalError::Backend(format!(
                    "object already exists: {key}"
                )));
            }
            Err(e) => return Err(backend_error("create", key, e)),
        };

        let written = match file.write_all(&content).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // Do not leave a truncated object behind.
            let _ = fs::remove_file(&path).await;
            return Err(backend_error("write", key, e));
        }

        if let Err(e) = fs::write(self.meta_path(key), content_type).await {
            let _ = fs::remove_file(&path).await;
            return Err(backend_error("write content type of", key, e));
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobObject> {
        let path = self.object_path(key)?;

        match fs::read(&path).await {
            Ok(content) => Ok(BlobObject {
                content,
                content_type: self.content_type(key).await,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PortalError::Backend(format!("object not found: {key}")))
            }
            Err(e) => Err(backend_error("read", key, e)),
        }
    }

    async fn list(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<BlobEntry>> {
        let mut dir = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| backend_error("list", prefix, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| backend_error("list", prefix, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(prefix) || validate_key(&name).is_err() {
                continue;
            }
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| backend_error("stat", &name, e))?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(BlobEntry {
                content_type: self.content_type(&name).await,
                key: name,
                size: metadata.len(),
            });
        }

        // read_dir order is platform dependent; list by name like a bucket would.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                if let Err(e) = fs::remove_file(self.meta_path(key)).await {
                    if e.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(key = %key, error = %e, "Failed to remove content type");
                    }
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PortalError::Backend(format!("object not found: {key}")))
            }
            Err(e) => Err(backend_error("delete", key, e)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        blob_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, LocalBlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path(), "http://localhost:8080").unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("uploads");
        assert!(!path.exists());

        let store = LocalBlobStore::new(&path, "http://localhost:8080/").unwrap();

        assert!(path.exists());
        assert_eq!(store.base_path(), path);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (_temp_dir, store) = setup_store();

        store
            .put("carol_1_notes.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();

        let object = store.get("carol_1_notes.txt").await.unwrap();
        assert_eq!(object.content, b"hello");
        assert_eq!(object.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_content_type_is_kept() {
        let (temp_dir, store) = setup_store();

        store
            .put("carol_1_data", b"{}".to_vec(), "application/json")
            .await
            .unwrap();

        let object = store.get("carol_1_data").await.unwrap();
        assert_eq!(object.content_type, "application/json");
        let entries = store.list("carol_", None).await.unwrap();
        assert_eq!(entries[0].content_type, "application/json");

        // Survives reopening the directory.
        let reopened = LocalBlobStore::new(temp_dir.path(), "http://localhost:8080").unwrap();
        assert_eq!(
            reopened.get("carol_1_data").await.unwrap().content_type,
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_content_type_falls_back_to_extension() {
        let (temp_dir, store) = setup_store();

        store.put("carol_1_a.png", b"x".to_vec(), "").await.unwrap();
        std::fs::write(temp_dir.path().join("carol_2_b.txt"), b"y").unwrap();

        assert_eq!(store.get("carol_1_a.png").await.unwrap().content_type, "image/png");
        assert_eq!(store.get("carol_2_b.txt").await.unwrap().content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_put_existing_key_fails() {
        let (_temp_dir, store) = setup_store();

        store.put("k_1_a.txt", b"one".to_vec(), "text/plain").await.unwrap();
        let result = store.put("k_1_a.txt", b"two".to_vec(), "text/plain").await;

        match result {
            Err(PortalError::Backend(msg)) => assert!(msg.contains("already exists")),
            other => panic!("Expected Backend error, got {other:?}"),
        }
        assert_eq!(store.get("k_1_a.txt").await.unwrap().content, b"one");
    }

    #[tokio::test]
    async fn test_put_rejects_path_keys() {
        let (_temp_dir, store) = setup_store();

        let result = store.put("../escape", b"x".to_vec(), "text/plain").await;
        assert!(matches!(result, Err(PortalError::Backend(_))));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_temp_dir, store) = setup_store();

        match store.get("missing").await {
            Err(PortalError::Backend(msg)) => assert_eq!(msg, "object not found: missing"),
            other => panic!("Expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let (_temp_dir, store) = setup_store();

        for key in ["al_1_a.txt", "alice_2_b.txt", "alice_1_c.png", "bob_1_d.txt"] {
            store.put(key, b"data".to_vec(), "").await.unwrap();
        }

        let alice: Vec<String> = store
            .list("alice_", None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(alice, vec!["alice_1_c.png", "alice_2_b.txt"]);

        let al = store.list("al_", None).await.unwrap();
        assert_eq!(al.len(), 1);
        assert_eq!(al[0].key, "al_1_a.txt");
        assert_eq!(al[0].size, 4);
        assert_eq!(al[0].content_type, "text/plain");

        // The content type directory is not a blob.
        assert_eq!(store.list("", None).await.unwrap().len(), 4);
        assert_eq!(store.list("", Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_skips_directories() {
        let (temp_dir, store) = setup_store();
        std::fs::create_dir(temp_dir.path().join("carol_1_dir")).unwrap();
        store.put("carol_2_a.txt", b"a".to_vec(), "").await.unwrap();

        let entries = store.list("carol_", None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "carol_2_a.txt");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, store) = setup_store();

        store.put("k_1_a.txt", b"x".to_vec(), "text/plain").await.unwrap();
        store.delete("k_1_a.txt").await.unwrap();

        assert!(store.list("k_", None).await.unwrap().is_empty());
        assert!(!store.meta_path("k_1_a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_backend_error() {
        let (_temp_dir, store) = setup_store();

        match store.delete("k_1_a.txt").await {
            Err(PortalError::Backend(msg)) => assert!(msg.contains("not found")),
            other => panic!("Expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_binary_content() {
        let (_temp_dir, store) = setup_store();
        let content: Vec<u8> = (0..=255).collect();

        store
            .put("k_1_blob.bin", content.clone(), "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(store.get("k_1_blob.bin").await.unwrap().content, content);
    }

    #[test]
    fn test_public_url() {
        let (_temp_dir, store) = setup_store();
        assert_eq!(
            store.public_url("carol_1_notes.txt"),
            "http://localhost:8080/blobs/carol_1_notes.txt"
        );
    }
}
