//! API handlers for the portal.

pub mod access;
pub mod blob;
pub mod landing;
pub mod upload;

pub use access::*;
pub use blob::*;
pub use landing::*;
pub use upload::*;

use std::sync::Arc;

use crate::file::PortalService;

use super::middleware::JwtState;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Portal service.
    pub service: PortalService,
    /// Access grant issuer.
    pub jwt: Arc<JwtState>,
    /// Portal name shown on the landing document.
    pub portal_name: String,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: PortalService, jwt: Arc<JwtState>) -> Self {
        Self {
            service,
            jwt,
            portal_name: "Cloud Storage Portal".to_string(),
        }
    }

    /// Set the portal name.
    pub fn with_portal_name(mut self, name: impl Into<String>) -> Self {
        self.portal_name = name.into();
        self
    }
}
