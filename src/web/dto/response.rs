//! Response DTOs for Web API.

use serde::Serialize;

use crate::file::{FileEntry, UploadReceipt};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Landing document.
#[derive(Debug, Serialize)]
pub struct LandingResponse {
    /// Portal name.
    pub name: String,
    /// Navigation links.
    pub links: LandingLinks,
}

/// Links offered on the landing document.
#[derive(Debug, Serialize)]
pub struct LandingLinks {
    /// Upload endpoint.
    pub upload: String,
    /// Verification endpoint.
    pub verify: String,
    /// Listing endpoint.
    pub files: String,
}

/// A file in a listing.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    /// Storage key, used for url and delete calls.
    pub key: String,
    /// Original file name.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type.
    pub content_type: String,
    /// Download URL.
    pub url: String,
}

impl From<FileEntry> for FileResponse {
    fn from(entry: FileEntry) -> Self {
        Self {
            key: entry.key,
            display_name: entry.display_name,
            size: entry.size,
            content_type: entry.content_type,
            url: entry.url,
        }
    }
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Storage key.
    pub file_key: String,
    /// Original file name.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Download URL.
    pub url: String,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            file_key: receipt.file_key,
            display_name: receipt.display_name,
            size: receipt.size,
            url: receipt.url,
        }
    }
}

/// Verification response.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Access grant (JWT).
    pub access_token: String,
    /// Grant lifetime in seconds.
    pub expires_in: u64,
    /// Verified user name.
    pub user_name: String,
    /// The user's files.
    pub files: Vec<FileResponse>,
}

/// Download URL response.
#[derive(Debug, Serialize)]
pub struct FileUrlResponse {
    /// Storage key.
    pub key: String,
    /// Download URL.
    pub url: String,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Deleted storage key.
    pub key: String,
    /// Always true.
    pub deleted: bool,
}
