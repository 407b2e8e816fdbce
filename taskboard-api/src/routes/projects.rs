/// Project endpoints
///
/// - `GET /v1/projects` - Projects the caller owns or belongs to
/// - `POST /v1/projects` - Create a project owned by the caller
/// - `GET /v1/projects/:id` - Project detail with members
/// - `PATCH /v1/projects/:id` - Owner-only update

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::project::ProjectSummary,
    services::project::{self, CreateProjectInput, ProjectDetails, UpdateProjectInput},
};
use uuid::Uuid;
use validator::Validate;

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    Ok(Json(project::list_projects(&state.db, &auth).await?))
}

/// Creates a project
///
/// ```text
/// POST /v1/projects
///
/// { "name": "Apollo", "description": "Moon landing", "member_ids": ["uuid"] }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty name or unknown member id
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult<(StatusCode, Json<ProjectDetails>)> {
    input.validate()?;

    let project = project::create_project(&state.db, &auth, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetails>> {
    Ok(Json(project::get_project(&state.db, &auth, project_id).await?))
}

/// Updates name, description or members
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: No such project
/// - `422 Unprocessable Entity`: Empty name or unknown member id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(input): Json<UpdateProjectInput>,
) -> ApiResult<Json<ProjectDetails>> {
    input.validate()?;

    Ok(Json(
        project::update_project(&state.db, &auth, project_id, input).await?,
    ))
}
