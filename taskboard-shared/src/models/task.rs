/// Task model and database operations
///
/// Tasks belong to a project (or, for legacy personal tasks, to no project),
/// are authored by one user and may be assigned to any number of users.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('TODO', 'INPROGRESS', 'COMPLETED');
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(50) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'TODO',
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     due_date TIMESTAMPTZ,
///     project_id UUID REFERENCES projects(id) ON DELETE CASCADE,
///     created_by_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_assignees (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::de::{Deserializer, IntoDeserializer};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::project::ProjectSummary;
use super::user::UserSummary;

/// Workflow column of a task
///
/// Any status can move to any other; no transitions are restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// All statuses in board column order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "INPROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

/// Task priority, ordered LOW < MEDIUM < HIGH in the database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task with its creator, assignees and project resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,

    pub created_by: UserSummary,

    pub assignees: Vec<UserSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

/// Projection used on the profile page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskOverview {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// Task joined with creator and project names
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    #[sqlx(flatten)]
    task: Task,
    created_by_name: String,
    project_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AssigneeRow {
    task_id: Uuid,
    id: Uuid,
    name: String,
}

/// Equality filter that can be switched off with `ALL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Filter<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Filter::All => None,
            Filter::Only(value) => Some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Filter<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "ALL" {
            return Ok(Filter::All);
        }
        let inner: serde::de::value::StringDeserializer<D::Error> = raw.into_deserializer();
        T::deserialize(inner).map(Filter::Only)
    }
}

/// Column to order task lists by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Title,
    Priority,
    #[serde(alias = "dueDate")]
    DueDate,
    #[default]
    None,
}

impl SortBy {
    fn column(&self) -> Option<&'static str> {
        match self {
            SortBy::Title => Some("t.title"),
            SortBy::Priority => Some("t.priority"),
            SortBy::DueDate => Some("t.due_date"),
            SortBy::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Which tasks a list query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task of one project
    Project(Uuid),

    /// Tasks the user created or is assigned to, across projects
    Involving(Uuid),
}

/// Status/priority filters and ordering for task lists
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskQuery {
    pub status: Filter<TaskStatus>,
    pub priority: Filter<TaskPriority>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

const TASK_ROW_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date, \
     t.project_id, t.created_by_id, t.created_at, t.updated_at, \
     u.name AS created_by_name, p.name AS project_name \
     FROM tasks t \
     JOIN users u ON u.id = t.created_by_id \
     LEFT JOIN projects p ON p.id = t.project_id";

/// Builds the list query
///
/// Binds, in order: the scope id, then the status filter if set, then the
/// priority filter if set.
pub fn build_list_sql(scope: &TaskScope, query: &TaskQuery) -> String {
    let mut sql = String::from(TASK_ROW_SELECT);

    match scope {
        TaskScope::Project(_) => sql.push_str(" WHERE t.project_id = $1"),
        TaskScope::Involving(_) => sql.push_str(
            " WHERE (t.created_by_id = $1 OR EXISTS (\
             SELECT 1 FROM task_assignees ta WHERE ta.task_id = t.id AND ta.user_id = $1))",
        ),
    }

    let mut bind_count = 1;
    if query.status.value().is_some() {
        bind_count += 1;
        sql.push_str(&format!(" AND t.status = ${}", bind_count));
    }
    if query.priority.value().is_some() {
        bind_count += 1;
        sql.push_str(&format!(" AND t.priority = ${}", bind_count));
    }

    if let Some(column) = query.sort_by.column() {
        sql.push_str(&format!(" ORDER BY {} {}", column, query.sort_order.keyword()));
    }

    sql
}

/// Input for inserting a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub created_by_id: Uuid,
}

/// Column changes for a task update
///
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    /// Inserts a task row (assignees are connected separately)
    pub async fn create(conn: &mut PgConnection, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, project_id, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, priority, due_date, project_id,
                      created_by_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.project_id)
        .bind(data.created_by_id)
        .fetch_one(conn)
        .await
    }

    /// Finds a task row by ID
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date, project_id,
                   created_by_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Resolves a task's project reference
    ///
    /// `None` means the task does not exist; `Some(None)` means it exists but
    /// has no project.
    pub async fn find_project_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Option<Uuid>>, sqlx::Error> {
        sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads one task with creator, assignees and project
    pub async fn find_details(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetails>, sqlx::Error> {
        let sql = format!("{} WHERE t.id = $1", TASK_ROW_SELECT);
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => Ok(Self::hydrate(pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Lists tasks for a scope with filters and ordering applied
    pub async fn list(
        pool: &PgPool,
        scope: TaskScope,
        query: TaskQuery,
    ) -> Result<Vec<TaskDetails>, sqlx::Error> {
        let sql = build_list_sql(&scope, &query);

        let scope_id = match scope {
            TaskScope::Project(id) | TaskScope::Involving(id) => id,
        };

        let mut q = sqlx::query_as::<_, TaskRow>(&sql).bind(scope_id);
        if let Some(status) = query.status.value() {
            q = q.bind(*status);
        }
        if let Some(priority) = query.priority.value() {
            q = q.bind(*priority);
        }

        let rows = q.fetch_all(pool).await?;
        Self::hydrate(pool, rows).await
    }

    /// Attaches assignees to rows, keeping row order
    async fn hydrate(pool: &PgPool, rows: Vec<TaskRow>) -> Result<Vec<TaskDetails>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.task.id).collect();
        let assignee_rows = sqlx::query_as::<_, AssigneeRow>(
            r#"
            SELECT ta.task_id, u.id, u.name
            FROM task_assignees ta
            JOIN users u ON u.id = ta.user_id
            WHERE ta.task_id = ANY($1)
            ORDER BY u.name
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut assignees: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
        for row in assignee_rows {
            assignees.entry(row.task_id).or_default().push(UserSummary {
                id: row.id,
                name: row.name,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let created_by = UserSummary {
                    id: row.task.created_by_id,
                    name: row.created_by_name,
                };
                let project = match (row.task.project_id, row.project_name) {
                    (Some(id), Some(name)) => Some(ProjectSummary { id, name }),
                    _ => None,
                };
                TaskDetails {
                    assignees: assignees.remove(&row.task.id).unwrap_or_default(),
                    created_by,
                    project,
                    task: row.task,
                }
            })
            .collect())
    }

    /// Writes the given column changes and bumps `updated_at`
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if changes.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if changes.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if changes.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, due_date, \
             project_id, created_by_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = changes.title {
            q = q.bind(title);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(status) = changes.status {
            q = q.bind(status);
        }
        if let Some(priority) = changes.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(conn).await
    }

    /// Sets the status column only
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Connects assignees, ignoring ones already present
    pub async fn add_assignees(
        conn: &mut PgConnection,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO task_assignees (task_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_ids)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Replaces the whole assignee set; an empty slice clears it
    pub async fn replace_assignees(
        conn: &mut PgConnection,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        Self::add_assignees(conn, task_id, user_ids).await
    }

    /// Hard-deletes a task; assignee rows go with it via cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Tasks the user is assigned to
    pub async fn list_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskOverview>, sqlx::Error> {
        sqlx::query_as::<_, TaskOverview>(
            r#"
            SELECT t.id, t.title, t.status, t.created_at
            FROM tasks t
            JOIN task_assignees ta ON ta.task_id = t.id
            WHERE ta.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Tasks the user created
    pub async fn list_created_by(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskOverview>, sqlx::Error> {
        sqlx::query_as::<_, TaskOverview>(
            r#"
            SELECT id, title, status, created_at
            FROM tasks
            WHERE created_by_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_assigned_to(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM task_assignees WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn count_created_by(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE created_by_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}
