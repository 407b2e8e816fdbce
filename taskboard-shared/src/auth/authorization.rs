/// Project-scoped access control
///
/// A user may act on a project if they own it or are listed among its
/// members. Tasks inherit access from their project; a task with no project
/// is reachable by nobody through these checks.
///
/// The `verify_*` functions report an [`AccessDecision`] and never fail on a
/// negative answer. The `require_*` wrappers turn that decision into an
/// [`AuthzError`] for use with `?` in services.
///
/// Every call goes to the database. Nothing is cached between calls.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_task_access, verify_user_access_to_project};
/// use taskboard_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, auth: AuthContext, project_id: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let decision = verify_user_access_to_project(&pool, project_id, auth.caller()).await?;
/// if !decision.is_allowed() {
///     println!("denied: {:?}", decision.reason());
/// }
///
/// require_task_access(&pool, task_id, &auth).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::{project::Project, task::Task};

const INVALID_USER: &str = "Invalid userId";
const NO_PROJECT_ACCESS: &str = "User is neither the owner nor a member of this project";
const NO_ASSOCIATED_PROJECT: &str = "Task has no associated project";

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,

    /// Access refused, with a human-readable reason
    Denied(String),

    /// The task being checked does not exist
    NotFound,
}

impl AccessDecision {
    fn denied(reason: &str) -> Self {
        AccessDecision::Denied(reason.to_string())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    /// Reason for a refusal, `None` when allowed
    pub fn reason(&self) -> Option<&str> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Denied(reason) => Some(reason),
            AccessDecision::NotFound => Some("Task not found"),
        }
    }
}

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller may not touch the project or task
    #[error("{0}")]
    Forbidden(String),

    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Only the project owner can update this project")]
    NotOwner,

    #[error("Only the creator of a task can edit it")]
    NotCreator,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks whether `user_id` owns or is a member of `project_id`
///
/// Fails closed: a missing or nil `user_id` is denied without querying. A
/// project that does not exist is denied like one the user cannot see.
pub async fn verify_user_access_to_project(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<AccessDecision, sqlx::Error> {
    let Some(user_id) = user_id.filter(|id| !id.is_nil()) else {
        return Ok(AccessDecision::denied(INVALID_USER));
    };

    if Project::is_owner_or_member(pool, project_id, user_id).await? {
        Ok(AccessDecision::Allowed)
    } else {
        tracing::debug!(%project_id, %user_id, "project access denied");
        Ok(AccessDecision::denied(NO_PROJECT_ACCESS))
    }
}

/// Checks access to a task through the project it belongs to
///
/// A task without a project is always denied. A task that does not exist
/// yields [`AccessDecision::NotFound`].
pub async fn verify_project_access_using_task_id(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<AccessDecision, sqlx::Error> {
    if user_id.filter(|id| !id.is_nil()).is_none() {
        return Ok(AccessDecision::denied(INVALID_USER));
    }

    match Task::find_project_id(pool, task_id).await? {
        None => Ok(AccessDecision::NotFound),
        Some(None) => Ok(AccessDecision::denied(NO_ASSOCIATED_PROJECT)),
        Some(Some(project_id)) => verify_user_access_to_project(pool, project_id, user_id).await,
    }
}

/// Requires the caller to own or be a member of `project_id`
pub async fn require_project_access(
    pool: &PgPool,
    project_id: Uuid,
    auth: &AuthContext,
) -> Result<(), AuthzError> {
    match verify_user_access_to_project(pool, project_id, auth.caller()).await? {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied(reason) => Err(AuthzError::Forbidden(reason)),
        AccessDecision::NotFound => Err(AuthzError::ProjectNotFound(project_id)),
    }
}

/// Requires the caller to have access to the project of `task_id`
pub async fn require_task_access(
    pool: &PgPool,
    task_id: Uuid,
    auth: &AuthContext,
) -> Result<(), AuthzError> {
    match verify_project_access_using_task_id(pool, task_id, auth.caller()).await? {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied(reason) => Err(AuthzError::Forbidden(reason)),
        AccessDecision::NotFound => Err(AuthzError::TaskNotFound(task_id)),
    }
}

/// Requires the caller to be the owner of `project_id` and returns the project
pub async fn require_project_owner(
    pool: &PgPool,
    project_id: Uuid,
    auth: &AuthContext,
) -> Result<Project, AuthzError> {
    let caller = auth
        .caller()
        .ok_or_else(|| AuthzError::Forbidden(INVALID_USER.to_string()))?;

    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or(AuthzError::ProjectNotFound(project_id))?;

    if project.owner_id != caller {
        return Err(AuthzError::NotOwner);
    }

    Ok(project)
}

/// Requires the caller to be the task's creator
pub fn require_task_creator(task: &Task, auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.caller() != Some(task.created_by_id) {
        return Err(AuthzError::NotCreator);
    }

    Ok(())
}
