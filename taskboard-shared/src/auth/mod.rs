/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: HS256 access and refresh tokens
/// - [`middleware`]: Bearer header parsing and the [`middleware::AuthContext`]
/// - [`authorization`]: Project and task access checks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "jsmith", TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
