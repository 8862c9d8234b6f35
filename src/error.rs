//! Error types for the portal.

use thiserror::Error;

/// Common error type for portal operations.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Missing or malformed user input, raised before any backend call.
    #[error("validation error: {0}")]
    Validation(String),

    /// No access records exist for the requested user name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Password did not match the stored hash.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The verified user tried to touch a key it does not own.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Failure reported by the blob store, the metadata store or the hasher.
    ///
    /// The message is passed through to the user as-is.
    #[error("{0}")]
    Backend(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PortalError {
    fn from(e: sqlx::Error) -> Self {
        PortalError::Backend(format!("metadata store error: {e}"))
    }
}

impl PortalError {
    /// Returns true if the error came from one of the backend collaborators.
    pub fn is_backend(&self) -> bool {
        matches!(self, PortalError::Backend(_))
    }

    /// The message shown to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Validation(msg)
            | PortalError::NotFound(msg)
            | PortalError::Auth(msg)
            | PortalError::Permission(msg)
            | PortalError::Backend(msg)
            | PortalError::Config(msg) => msg.clone(),
            PortalError::Io(e) => e.to_string(),
        }
    }
}

/// Result type alias for portal operations.
pub type Result<T> = std::result::Result<T, PortalError>;
