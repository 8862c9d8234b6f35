//! Web API for the portal.
//!
//! Exposes the landing document, the upload form endpoint, the access
//! endpoints guarded by access grants, and public blob downloads.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
