//! Access grant middleware.
//!
//! A successful verification issues a short-lived JWT whose subject is the
//! verified user name. Every access route requires it as a Bearer token.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::file::VerifiedUser;
use crate::web::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (verified user name).
    pub sub: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Keys and settings for issuing and checking access grants.
#[derive(Clone)]
pub struct JwtState {
    encoding_key: EncodingKey,
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
    /// Grant lifetime in seconds.
    pub expiry_secs: u64,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Issue an access grant for a verified user.
    pub fn issue(&self, user: &VerifiedUser) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = AccessClaims {
            sub: user.user_name().to_string(),
            iat: now,
            exp: now + self.expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Check a grant and return its claims.
    pub fn check(&self, token: &str) -> Result<AccessClaims, ApiError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::unauthorized("Invalid or expired access grant")
            })
    }
}

/// Extractor for requests carrying a valid access grant.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    /// The user the grant was issued to.
    pub fn verified_user(&self) -> VerifiedUser {
        VerifiedUser::from_grant(&self.0.sub)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        // Set by jwt_auth
        let jwt_state = parts
            .extensions
            .get::<Arc<JwtState>>()
            .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

        jwt_state.check(token).map(AuthUser)
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_token(secret: &str, claims: &AccessClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_jwt_state_new() {
        let state = JwtState::new("test-secret", 900);
        assert!(state.validation.validate_exp);
        assert_eq!(state.expiry_secs, 900);
    }

    #[test]
    fn test_issue_and_check() {
        let state = JwtState::new("test-secret", 900);

        let token = state.issue(&VerifiedUser::from_grant("carol")).unwrap();
        let claims = state.check(&token).unwrap();

        assert_eq!(claims.sub, "carol");
        assert_eq!(claims.exp, claims.iat + 900);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token() {
        let secret = "test-secret";
        let state = JwtState::new(secret, 900);

        let claims = AccessClaims {
            sub: "carol".to_string(),
            iat: (chrono::Utc::now().timestamp() - 7200) as u64,
            exp: (chrono::Utc::now().timestamp() - 3600) as u64, // Expired 1 hour ago
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = create_test_token(secret, &claims);
        assert!(state.check(&token).is_err());
    }

    #[test]
    fn test_invalid_secret() {
        let token = JwtState::new("secret1", 900)
            .issue(&VerifiedUser::from_grant("carol"))
            .unwrap();
        let state = JwtState::new("secret2", 900); // Different secret

        assert!(state.check(&token).is_err());
    }

    #[test]
    fn test_auth_user_maps_to_verified_user() {
        let user = AuthUser(AccessClaims {
            sub: "carol".to_string(),
            iat: 0,
            exp: 0,
            jti: String::new(),
        });
        assert_eq!(user.verified_user().user_name(), "carol");
    }
}
