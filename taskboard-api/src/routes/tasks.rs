/// Task endpoints
///
/// - `GET /v1/tasks` - List with `project_id`, `status`, `priority`, `sort_by`, `sort_order`
/// - `GET /v1/tasks/board` - Same filters, grouped into status columns
/// - `POST /v1/tasks` - Create
/// - `PATCH /v1/tasks/:id` - Partial update (creator only)
/// - `PUT /v1/tasks/:id/status` - Move to another status
/// - `DELETE /v1/tasks/:id` - Delete
///
/// `status` and `priority` accept `ALL` to disable the filter.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::task::TaskDetails,
    services::task::{
        self, ChangeStatusInput, CreateTaskInput, ListTasksParams, TaskBoard, UpdateTaskInput,
    },
};
use uuid::Uuid;
use validator::Validate;

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<Vec<TaskDetails>>> {
    Ok(Json(task::list_tasks(&state.db, &auth, &params).await?))
}

pub async fn task_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<TaskBoard>> {
    Ok(Json(task::task_board(&state.db, &auth, &params).await?))
}

/// Creates a task
///
/// ```text
/// POST /v1/tasks
///
/// {
///   "project_id": "uuid",
///   "title": "Write launch notes",
///   "description": "Cover the API changes",
///   "priority": "HIGH",
///   "due_date": "2025-03-01T00:00:00Z",
///   "assignee_ids": ["uuid"]
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller has no access to the project
/// - `422 Unprocessable Entity`: Bad title/description or unknown assignee id
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<TaskDetails>)> {
    input.validate()?;

    let task = task::create_task(&state.db, &auth, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<Json<TaskDetails>> {
    input.validate()?;

    Ok(Json(task::update_task(&state.db, &auth, task_id, input).await?))
}

pub async fn change_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(input): Json<ChangeStatusInput>,
) -> ApiResult<Json<TaskDetails>> {
    Ok(Json(
        task::change_task_status(&state.db, &auth, task_id, input.status).await?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    task::delete_task(&state.db, &auth, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
