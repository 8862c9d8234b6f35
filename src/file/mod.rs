//! File handling for the portal.
//!
//! This module provides:
//! - File key derivation and input validation
//! - The blob store abstraction and its implementations
//! - The portal service driving upload, verification, listing and deletion
//! - Orphan reconciliation between blobs and access records

mod key;
pub mod reconcile;
mod service;
pub mod storage;

pub use key::{
    content_type_for, owner_prefix, sanitize_file_name, validate_user_name, FileKey,
    KEY_SEPARATOR,
};
pub use reconcile::{OrphanReport, RepairSummary};
pub use service::{FileEntry, PortalService, UploadReceipt, UploadRequest, VerifiedUser};
pub use storage::{
    open_blob_store, BlobEntry, BlobObject, BlobStore, LocalBlobStore, MemoryBlobStore,
};

/// Maximum length for the original file name (in characters).
pub const MAX_FILENAME_LENGTH: usize = 200;

/// Maximum length for a user name (in characters).
pub const MAX_USER_NAME_LENGTH: usize = 64;

/// Maximum length of an encoded file key (in bytes), the usual file name limit.
pub const MAX_KEY_BYTES: usize = 255;

/// Default maximum upload size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum number of entries in a listing.
pub const DEFAULT_LIST_LIMIT: usize = 100;
