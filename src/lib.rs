//! Cloud Storage Portal
//!
//! A small file portal: upload a file under a name and a password, then use
//! the same credentials to list, download or delete it.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod session;
pub mod web;

pub use auth::{hash_password, validate_password, verify_password, HashCost, PasswordError};
pub use config::Config;
pub use db::{AccessRecord, AccessRepository, Database, NewAccessRecord};
pub use error::{PortalError, Result};
pub use file::{
    open_blob_store, BlobStore, FileEntry, FileKey, LocalBlobStore, MemoryBlobStore,
    PortalService, UploadReceipt, UploadRequest, VerifiedUser,
};
pub use session::{AccessSession, AccessView, ErrorKind};
pub use web::WebServer;
