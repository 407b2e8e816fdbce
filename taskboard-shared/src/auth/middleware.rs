/// Bearer token authentication for Axum
///
/// [`authenticate_bearer`] turns an `Authorization: Bearer <token>` header
/// into an [`AuthContext`]. The API server calls it from its middleware and
/// inserts the context into request extensions, where handlers pick it up.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.name)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// Identity of the caller, added to request extensions after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Display name carried in the token
    pub name: String,
}

impl AuthContext {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
        }
    }

    /// Caller id usable for access checks
    ///
    /// The nil UUID never identifies a user and is reported as absent.
    pub fn caller(&self) -> Option<Uuid> {
        Some(self.user_id).filter(|id| !id.is_nil())
    }
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),
}

/// Extracts and validates the bearer access token from `headers`
///
/// # Errors
///
/// - `MissingCredentials` when there is no usable `Authorization` header
/// - `InvalidFormat` when the header is not `Bearer <token>`
/// - `InvalidToken` when the token is expired, forged or a refresh token
pub fn authenticate_bearer(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext::new(claims.sub, claims.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use axum::http::HeaderValue;

    const SECRET: &str = "middleware-test-secret-32-bytes-long!";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_caller_filters_nil() {
        assert_eq!(AuthContext::new(Uuid::nil(), "ghost").caller(), None);

        let id = Uuid::new_v4();
        assert_eq!(AuthContext::new(id, "alice").caller(), Some(id));
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "alice", TokenType::Access), SECRET).unwrap();

        let ctx = authenticate_bearer(&headers_with(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(ctx, AuthContext::new(user_id, "alice"));
    }

    #[test]
    fn test_authenticate_missing_header() {
        assert!(matches!(
            authenticate_bearer(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_authenticate_wrong_scheme() {
        assert!(matches!(
            authenticate_bearer(&headers_with("Basic dXNlcjpwYXNz"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_bearer(&headers_with("Bearer "), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let token =
            create_token(&Claims::new(Uuid::new_v4(), "alice", TokenType::Refresh), SECRET).unwrap();

        assert!(matches!(
            authenticate_bearer(&headers_with(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
