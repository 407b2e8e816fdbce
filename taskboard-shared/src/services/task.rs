/// Task operations
///
/// Listing is scoped either to one project (access required) or to the tasks
/// the caller created or is assigned to. Mutations go through the task's
/// project: a task without a project cannot be changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{caller_id, dedup_ids, ensure_users_exist, ServiceError, ServiceResult};
use crate::auth::authorization::{require_project_access, require_task_access, require_task_creator};
use crate::auth::middleware::AuthContext;
use crate::models::deserialize_nullable;
use crate::models::task::{
    CreateTask, Filter, SortBy, SortOrder, Task, TaskChanges, TaskDetails, TaskPriority, TaskQuery,
    TaskScope, TaskStatus,
};

/// Query string of the task list and board endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksParams {
    /// Restrict to one project instead of "my tasks"
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub status: Filter<TaskStatus>,

    #[serde(default)]
    pub priority: Filter<TaskPriority>,

    #[serde(default)]
    pub sort_by: SortBy,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListTasksParams {
    fn query(&self) -> TaskQuery {
        TaskQuery {
            status: self.status,
            priority: self.priority,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskInput {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
}

/// Partial task update
///
/// Absent keys are left alone. `due_date: null` clears the due date and
/// `assignee_ids: []` removes every assignee.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub assignee_ids: Option<Vec<Uuid>>,
}

impl UpdateTaskInput {
    /// Splits the patch into column changes and the replacement assignee set
    pub fn into_parts(self) -> (TaskChanges, Option<Vec<Uuid>>) {
        let changes = TaskChanges {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        };
        (changes, self.assignee_ids.map(dedup_ids))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChangeStatusInput {
    pub status: TaskStatus,
}

/// One kanban column
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<TaskDetails>,
}

/// Tasks grouped by status, always with all three columns in workflow order
#[derive(Debug, Clone, Serialize)]
pub struct TaskBoard {
    pub columns: Vec<BoardColumn>,
}

impl TaskBoard {
    /// Groups tasks by status, keeping their relative order within a column
    pub fn group(tasks: Vec<TaskDetails>) -> Self {
        let mut columns: Vec<BoardColumn> = TaskStatus::ALL
            .iter()
            .map(|status| BoardColumn {
                status: *status,
                tasks: Vec::new(),
            })
            .collect();

        for task in tasks {
            if let Some(column) = columns.iter_mut().find(|c| c.status == task.task.status) {
                column.tasks.push(task);
            }
        }

        Self { columns }
    }
}

/// Lists tasks with filters and ordering
///
/// With `project_id` the caller needs project access and gets every task of
/// that project. Without it the caller gets the tasks they created or are
/// assigned to.
pub async fn list_tasks(
    pool: &PgPool,
    auth: &AuthContext,
    params: &ListTasksParams,
) -> ServiceResult<Vec<TaskDetails>> {
    let scope = match params.project_id {
        Some(project_id) => {
            require_project_access(pool, project_id, auth).await?;
            TaskScope::Project(project_id)
        }
        None => TaskScope::Involving(caller_id(auth)?),
    };

    let tasks = Task::list(pool, scope, params.query()).await?;
    tracing::debug!(user_id = %auth.user_id, count = tasks.len(), "listed tasks");
    Ok(tasks)
}

/// Same task set as [`list_tasks`], grouped into status columns
pub async fn task_board(
    pool: &PgPool,
    auth: &AuthContext,
    params: &ListTasksParams,
) -> ServiceResult<TaskBoard> {
    list_tasks(pool, auth, params).await.map(TaskBoard::group)
}

/// Creates a task in a project the caller can access
///
/// Assignees must exist but need not be project members. Nothing is written
/// if any assignee id is unknown.
pub async fn create_task(
    pool: &PgPool,
    auth: &AuthContext,
    input: CreateTaskInput,
) -> ServiceResult<TaskDetails> {
    require_project_access(pool, input.project_id, auth).await?;
    let created_by_id = caller_id(auth)?;
    let assignee_ids = dedup_ids(input.assignee_ids);

    let mut tx = pool.begin().await?;
    ensure_users_exist(&mut tx, "assignee_ids", &assignee_ids).await?;

    let task = Task::create(
        &mut tx,
        CreateTask {
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            project_id: Some(input.project_id),
            created_by_id,
        },
    )
    .await?;
    Task::add_assignees(&mut tx, task.id, &assignee_ids).await?;
    tx.commit().await?;

    tracing::info!(
        task_id = %task.id,
        project_id = %input.project_id,
        user_id = %created_by_id,
        assignees = assignee_ids.len(),
        "task created"
    );

    Task::find_details(pool, task.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task", task.id))
}

/// Applies a partial update; only the task's creator may do this
pub async fn update_task(
    pool: &PgPool,
    auth: &AuthContext,
    task_id: Uuid,
    input: UpdateTaskInput,
) -> ServiceResult<TaskDetails> {
    require_task_access(pool, task_id, auth).await?;

    let existing = Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task", task_id))?;
    require_task_creator(&existing, auth)?;

    let (changes, assignee_ids) = input.into_parts();

    if !changes.is_empty() || assignee_ids.is_some() {
        let mut tx = pool.begin().await?;

        if let Some(ids) = &assignee_ids {
            ensure_users_exist(&mut tx, "assignee_ids", ids).await?;
        }

        Task::update(&mut tx, task_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Task", task_id))?;

        if let Some(ids) = &assignee_ids {
            Task::replace_assignees(&mut tx, task_id, ids).await?;
        }

        tx.commit().await?;
        tracing::info!(%task_id, user_id = %auth.user_id, "task updated");
    }

    Task::find_details(pool, task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task", task_id))
}

/// Moves a task to another status; any status may follow any other
pub async fn change_task_status(
    pool: &PgPool,
    auth: &AuthContext,
    task_id: Uuid,
    status: TaskStatus,
) -> ServiceResult<TaskDetails> {
    require_task_access(pool, task_id, auth).await?;

    if !Task::set_status(pool, task_id, status).await? {
        return Err(ServiceError::not_found("Task", task_id));
    }
    tracing::info!(%task_id, status = status.as_str(), user_id = %auth.user_id, "task status changed");

    Task::find_details(pool, task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task", task_id))
}

/// Hard-deletes a task the caller can access through its project
pub async fn delete_task(pool: &PgPool, auth: &AuthContext, task_id: Uuid) -> ServiceResult<()> {
    require_task_access(pool, task_id, auth).await?;

    if !Task::delete(pool, task_id).await? {
        return Err(ServiceError::not_found("Task", task_id));
    }
    tracing::info!(%task_id, user_id = %auth.user_id, "task deleted");

    Ok(())
}
