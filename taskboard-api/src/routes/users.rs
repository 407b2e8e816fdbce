/// User endpoints
///
/// - `GET /v1/projects/:id/users?search_term=&limit=` - Search project members
/// - `GET /v1/users/me` - Profile with tasks and projects
/// - `PATCH /v1/users/me` - Rename
/// - `GET /v1/users/me/stats` - Task and project counts

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::user::UserSummary,
    services::user::{self, SearchUsersParams, UpdateProfileInput, UserProfile, UserStats},
};
use uuid::Uuid;
use validator::Validate;

/// Members of a project whose name contains `search_term`, case-insensitively
///
/// `limit` must be between 1 and 20 and defaults to 10.
pub async fn search_project_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(params): Query<SearchUsersParams>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    params.validate()?;

    Ok(Json(
        user::search_users_in_project(&state.db, &auth, project_id, &params).await?,
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(user::get_profile(&state.db, &auth).await?))
}

/// Renames the caller
///
/// # Errors
///
/// - `409 Conflict`: Name taken by another user
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<UpdateProfileInput>,
) -> ApiResult<Json<UserSummary>> {
    input.validate()?;

    Ok(Json(user::update_profile(&state.db, &auth, input).await?))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(user::get_stats(&state.db, &auth).await?))
}
