//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

/// Credential verification request.
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    /// User name given at upload time.
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Name must be 1 to 64 characters"))]
    pub user_name: String,
    /// Password given at upload time.
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password must be 1 to 128 characters"))]
    pub password: String,
}

/// Query parameters for file deletion.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    /// Must be `true`; deletion is never implicit.
    #[serde(default)]
    pub confirm: bool,
}
