/// Project operations
///
/// Any owner or member may read a project. Only the owner may change its
/// name, description or membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{caller_id, dedup_ids, ensure_users_exist, required_name, ServiceError, ServiceResult};
use crate::auth::authorization::{require_project_access, require_project_owner};
use crate::auth::middleware::AuthContext;
use crate::models::deserialize_nullable;
use crate::models::project::{CreateProject, Project, ProjectChanges, ProjectSummary};
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Partial project update
///
/// `description: null` clears the description. `member_ids`, when present,
/// replaces the whole membership set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub description: Option<Option<String>>,

    pub member_ids: Option<Vec<Uuid>>,
}

/// Project with its owner and members resolved
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDetails {
    fn new(project: Project, members: Vec<UserSummary>) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            owner_id: project.owner_id,
            members,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Projects the caller owns or belongs to, most recently updated first
pub async fn list_projects(pool: &PgPool, auth: &AuthContext) -> ServiceResult<Vec<ProjectSummary>> {
    let user_id = caller_id(auth)?;
    Ok(Project::list_for_user(pool, user_id).await?)
}

pub async fn get_project(
    pool: &PgPool,
    auth: &AuthContext,
    project_id: Uuid,
) -> ServiceResult<ProjectDetails> {
    require_project_access(pool, project_id, auth).await?;

    let project = Project::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project", project_id))?;
    let members = Project::members(pool, project_id).await?;

    Ok(ProjectDetails::new(project, members))
}

/// Creates a project owned by the caller, with optional initial members
pub async fn create_project(
    pool: &PgPool,
    auth: &AuthContext,
    input: CreateProjectInput,
) -> ServiceResult<ProjectDetails> {
    let owner_id = caller_id(auth)?;
    let name = required_name("name", &input.name)?;
    let member_ids = dedup_ids(input.member_ids);

    let mut tx = pool.begin().await?;
    ensure_users_exist(&mut tx, "member_ids", &member_ids).await?;

    let project = Project::create(
        &mut tx,
        CreateProject {
            name,
            description: input.description,
            owner_id,
        },
    )
    .await?;
    Project::add_members(&mut tx, project.id, &member_ids).await?;
    let members = Project::members(&mut *tx, project.id).await?;
    tx.commit().await?;

    tracing::info!(project_id = %project.id, user_id = %owner_id, members = members.len(), "project created");

    Ok(ProjectDetails::new(project, members))
}

/// Owner-only update
///
/// Name and description are written only when they differ from the stored
/// values. With nothing to change and no member list, no write happens.
pub async fn update_project(
    pool: &PgPool,
    auth: &AuthContext,
    project_id: Uuid,
    input: UpdateProjectInput,
) -> ServiceResult<ProjectDetails> {
    let current = require_project_owner(pool, project_id, auth).await?;

    let name = input
        .name
        .as_deref()
        .map(|raw| required_name("name", raw))
        .transpose()?;
    let changes = ProjectChanges::diff(&current, name, input.description);
    let member_ids = input.member_ids.map(dedup_ids);

    if changes.is_empty() && member_ids.is_none() {
        tracing::debug!(%project_id, "project update with no changes");
        let members = Project::members(pool, project_id).await?;
        return Ok(ProjectDetails::new(current, members));
    }

    let mut tx = pool.begin().await?;

    if let Some(ids) = &member_ids {
        ensure_users_exist(&mut tx, "member_ids", ids).await?;
    }

    let project = Project::update(&mut tx, project_id, changes)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project", project_id))?;

    if let Some(ids) = &member_ids {
        Project::replace_members(&mut tx, project_id, ids).await?;
    }

    let members = Project::members(&mut *tx, project_id).await?;
    tx.commit().await?;

    tracing::info!(%project_id, user_id = %auth.user_id, "project updated");

    Ok(ProjectDetails::new(project, members))
}
