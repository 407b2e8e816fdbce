/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid name or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login and display name, unique across users
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Tokens returned by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub name: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

fn issue_tokens(state: &AppState, user: &User) -> ApiResult<TokenResponse> {
    let access_claims = jwt::Claims::new(user.id, user.name.clone(), jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, user.name.clone(), jwt::TokenType::Refresh);

    Ok(TokenResponse {
        user_id: user.id,
        name: user.name.clone(),
        access_token: jwt::create_token(&access_claims, state.jwt_secret())?,
        refresh_token: jwt::create_token(&refresh_claims, state.jwt_secret())?,
    })
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
///
/// { "name": "jsmith", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Name already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("name", "Name must be 1-100 characters"));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(&state.db, CreateUser { name, password_hash }).await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(issue_tokens(&state, &user)?)))
}

/// Login with name and password
///
/// Unknown names and wrong passwords get the same 401 response.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_name(&state.db, req.name.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(issue_tokens(&state, &user)?))
}

/// Exchanges a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
