//! Portal service.
//!
//! This module provides the high-level file operations:
//! - Upload with validation, single-password enforcement and ordered writes
//! - Credential verification against stored access records
//! - Listing, download-link resolution and deletion for a verified user

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{hash_password, validate_password, verify_password, HashCost, PasswordError};
use crate::db::{AccessRecord, AccessRepository, Database, NewAccessRecord};
use crate::{PortalError, Result};

use super::key::{content_type_for, owner_prefix, FileKey};
use super::storage::{BlobObject, BlobStore};
use super::{DEFAULT_LIST_LIMIT, DEFAULT_MAX_FILE_SIZE};

/// Request data for an upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Owner name.
    pub user_name: String,
    /// Password guarding the file.
    pub password: String,
    /// Original file name as sent by the client.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
    /// Content type sent by the client, if any.
    pub content_type: Option<String>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(
        user_name: impl Into<String>,
        password: impl Into<String>,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
            file_name: file_name.into(),
            content,
            content_type: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Key the blob and its access record were stored under.
    pub file_key: String,
    /// Name shown to the user.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Public download URL.
    pub url: String,
}

/// A user name whose password has been checked.
///
/// Only [`PortalService::verify`] and a validated access grant produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    user_name: String,
}

impl VerifiedUser {
    pub(crate) fn from_grant(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    /// The verified user name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }
}

/// One file in a user's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Storage key (keeps the owner prefix).
    pub key: String,
    /// Original file name.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type.
    pub content_type: String,
    /// Public download URL.
    pub url: String,
}

/// Service combining the blob store, the metadata store and the hasher.
#[derive(Clone)]
pub struct PortalService {
    db: Database,
    blobs: Arc<dyn BlobStore>,
    hash_cost: HashCost,
    max_file_size: u64,
    list_limit: usize,
}

impl PortalService {
    /// Create a new service with default limits and hash cost.
    pub fn new(db: Database, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            blobs,
            hash_cost: HashCost::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Set the Argon2 cost used for new hashes.
    pub fn with_hash_cost(mut self, hash_cost: HashCost) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    /// Set the maximum upload size in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Set the maximum number of entries in a listing.
    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// The metadata database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The blob store.
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Maximum upload size in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upload a file.
    ///
    /// # Validation
    /// All inputs are checked before any backend call. If the user name
    /// already owns files, the password must match them.
    ///
    /// # Ordering
    /// The blob is written first. The access record is only inserted after
    /// the blob write succeeded. A failed insert leaves the blob in place.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let UploadRequest {
            user_name,
            password,
            file_name,
            content,
            content_type,
        } = request;

        let key = FileKey::now(&user_name, &file_name)?;
        validate_password(&password).map_err(password_validation)?;
        if content.len() as u64 > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(PortalError::Validation(format!(
                "file too large (max {max_mb}MB)"
            )));
        }

        let repo = AccessRepository::new(self.db.pool());
        let existing = repo.list_by_user(&user_name).await?;
        if !existing.is_empty() && !self.matches_any(&password, &existing).await? {
            return Err(PortalError::Auth(
                "incorrect password for this user name".to_string(),
            ));
        }

        let file_key = key.to_string();
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| content_type_for(key.display_name()));
        let size = content.len() as u64;

        self.blobs
            .put(&file_key, content, &content_type)
            .await
            .map_err(|e| {
                warn!(user = %user_name, key = %file_key, error = %e, "Blob upload failed");
                PortalError::Backend(format!("upload failed: {e}"))
            })?;

        let password_hash = self.hash(&password).await.map_err(|e| {
            warn!(key = %file_key, error = %e, "Hashing failed after blob upload, blob is orphaned");
            e
        })?;

        repo.insert(&NewAccessRecord::new(&file_key, &user_name, password_hash))
            .await
            .map_err(|e| {
                warn!(key = %file_key, error = %e, "Access record insert failed, blob is orphaned");
                PortalError::Backend(format!("error saving file info: {e}"))
            })?;

        info!(user = %user_name, key = %file_key, size, "File uploaded");

        Ok(UploadReceipt {
            url: self.blobs.public_url(&file_key),
            display_name: key.display_name().to_string(),
            file_key,
            size,
        })
    }

    /// Verify a name and password against the stored access records.
    ///
    /// Fails with `NotFound` when the name has no records and with `Auth`
    /// when the password matches none of them.
    pub async fn verify(&self, user_name: &str, password: &str) -> Result<VerifiedUser> {
        if user_name.is_empty() || password.is_empty() {
            return Err(PortalError::Validation(
                "please enter both name and password".to_string(),
            ));
        }

        let records = AccessRepository::new(self.db.pool())
            .list_by_user(user_name)
            .await?;
        if records.is_empty() {
            debug!(user = %user_name, "Verification for unknown user name");
            return Err(PortalError::NotFound(
                "no files found for this user".to_string(),
            ));
        }

        if !self.matches_any(password, &records).await? {
            info!(user = %user_name, "Verification failed");
            return Err(PortalError::Auth("incorrect password".to_string()));
        }

        info!(user = %user_name, "User verified");
        Ok(VerifiedUser::from_grant(user_name))
    }

    /// List the verified user's files in blob store order.
    pub async fn list_files(&self, user: &VerifiedUser) -> Result<Vec<FileEntry>> {
        let prefix = owner_prefix(user.user_name());
        let entries = self
            .blobs
            .list(&prefix, Some(self.list_limit))
            .await
            .map_err(|e| PortalError::Backend(format!("error fetching files: {e}")))?;

        let files = entries
            .into_iter()
            .filter_map(|entry| {
                let key = FileKey::parse(&entry.key)?;
                if !key.is_owned_by(user.user_name()) {
                    return None;
                }
                Some(FileEntry {
                    url: self.blobs.public_url(&entry.key),
                    display_name: key.display_name().to_string(),
                    key: entry.key,
                    size: entry.size,
                    content_type: entry.content_type,
                })
            })
            .collect();

        Ok(files)
    }

    /// Resolve the download URL of one of the verified user's files.
    pub fn file_url(&self, user: &VerifiedUser, file_key: &str) -> Result<String> {
        check_owner(user, file_key)?;
        Ok(self.blobs.public_url(file_key))
    }

    /// Delete one of the verified user's files.
    ///
    /// The blob goes first; the access record is only removed after the
    /// blob delete succeeded.
    pub async fn delete_file(&self, user: &VerifiedUser, file_key: &str) -> Result<()> {
        check_owner(user, file_key)?;

        self.blobs.delete(file_key).await.map_err(|e| {
            warn!(user = %user.user_name(), key = %file_key, error = %e, "Blob delete failed");
            PortalError::Backend(format!("failed to delete: {e}"))
        })?;

        let removed = AccessRepository::new(self.db.pool())
            .delete_by_key(file_key)
            .await
            .map_err(|e| {
                warn!(key = %file_key, error = %e, "Access record delete failed after blob delete");
                PortalError::Backend(format!(
                    "file deleted but its access record could not be removed: {e}"
                ))
            })?;
        if !removed {
            warn!(key = %file_key, "Deleted blob had no access record");
        }

        info!(user = %user.user_name(), key = %file_key, "File deleted");
        Ok(())
    }

    /// Read a blob for the public download route.
    ///
    /// A key that is not in the store yields `NotFound`; other store
    /// failures stay `Backend`.
    pub async fn open_blob(&self, file_key: &str) -> Result<BlobObject> {
        match self.blobs.get(file_key).await {
            Ok(object) => Ok(object),
            Err(e) => {
                let exists = self
                    .blobs
                    .list(file_key, Some(1))
                    .await
                    .map(|entries| entries.iter().any(|entry| entry.key == file_key))
                    .unwrap_or(true);
                if exists {
                    Err(e)
                } else {
                    Err(PortalError::NotFound("file not found".to_string()))
                }
            }
        }
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| PortalError::Backend(format!("password hashing task failed: {e}")))?
            .map_err(|e| PortalError::Backend(e.to_string()))
    }

    /// Returns true if `password` matches any record's hash.
    async fn matches_any(&self, password: &str, records: &[AccessRecord]) -> Result<bool> {
        let password = password.to_string();
        let hashes: Vec<String> = records.iter().map(|r| r.password_hash.clone()).collect();
        tokio::task::spawn_blocking(move || {
            hashes.iter().any(|hash| match verify_password(&password, hash) {
                Ok(()) => true,
                Err(PasswordError::InvalidHash) => {
                    warn!("Stored password hash could not be parsed");
                    false
                }
                Err(_) => false,
            })
        })
        .await
        .map_err(|e| PortalError::Backend(format!("password verification task failed: {e}")))
    }
}

fn password_validation(e: PasswordError) -> PortalError {
    PortalError::Validation(e.to_string())
}

fn check_owner(user: &VerifiedUser, file_key: &str) -> Result<()> {
    match FileKey::parse(file_key) {
        Some(key) if key.is_owned_by(user.user_name()) => Ok(()),
        _ => Err(PortalError::Permission(
            "file does not belong to this user".to_string(),
        )),
    }
}

impl std::fmt::Debug for PortalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalService")
            .field("hash_cost", &self.hash_cost)
            .field("max_file_size", &self.max_file_size)
            .field("list_limit", &self.list_limit)
            .finish()
    }
}
