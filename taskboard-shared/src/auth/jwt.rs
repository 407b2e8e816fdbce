/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the user's id and display name, so
/// handlers can identify the caller without a database round trip.
///
/// # Token Types
///
/// - **Access Token**: 24 hours, sent as `Authorization: Bearer <token>`
/// - **Refresh Token**: 30 days, only accepted by `/v1/auth/refresh`
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, "jsmith", TokenType::Access);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// assert_eq!(validated.name, "jsmith");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim on every token we sign
pub const ISSUER: &str = "taskboard";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Token is valid but of the other type
    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// Default lifetime for the token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// `sub`, `iss`, `iat`, `exp` and `nbf` are the registered claims. `name` and
/// `token_type` are ours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Always [`ISSUER`]
    pub iss: String,

    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,

    /// Display name at the time the token was issued
    pub name: String,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default lifetime for `token_type`
    pub fn new(user_id: Uuid, name: impl Into<String>, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, name, token_type, token_type.default_expiration())
    }

    /// Creates claims expiring `expires_in` from now
    ///
    /// A negative duration produces an already-expired token, which tests use.
    pub fn with_expiration(
        user_id: Uuid,
        name: impl Into<String>,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            name: name.into(),
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Time left before expiry, `None` once expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        (self.exp > now).then(|| Duration::seconds(self.exp - now))
    }
}

/// Signs `claims` with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, expiry, `nbf` and issuer, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        })
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Issues a new access token for the user named in a valid refresh token
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let refresh_claims = validate_refresh_token(refresh_token, secret)?;
    let access_claims = Claims::new(refresh_claims.sub, refresh_claims.name, TokenType::Access);

    create_token(&access_claims, secret)
}
