/// User operations: member search for pickers, profile and stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{caller_id, required_name, ServiceError, ServiceResult};
use crate::auth::authorization::require_project_access;
use crate::auth::middleware::AuthContext;
use crate::models::project::{Project, ProjectOverview};
use crate::models::task::{Task, TaskOverview};
use crate::models::user::{User, UserSummary};

fn default_limit() -> i64 {
    10
}

/// Query string of the member search endpoint
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchUsersParams {
    #[serde(default)]
    pub search_term: String,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 20, message = "Limit must be between 1 and 20"))]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// The caller's account with everything they are involved in
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_tasks: Vec<TaskOverview>,
    pub created_tasks: Vec<TaskOverview>,
    pub member_projects: Vec<ProjectOverview>,
    pub owned_projects: Vec<ProjectOverview>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub assigned_tasks: i64,
    pub created_tasks: i64,
    pub member_projects: i64,
}

/// Case-insensitive name search among the members of a project
pub async fn search_users_in_project(
    pool: &PgPool,
    auth: &AuthContext,
    project_id: Uuid,
    params: &SearchUsersParams,
) -> ServiceResult<Vec<UserSummary>> {
    require_project_access(pool, project_id, auth).await?;

    let users = User::search_project_members(
        pool,
        project_id,
        params.search_term.trim(),
        params.limit,
    )
    .await?;

    tracing::debug!(%project_id, count = users.len(), "searched project members");
    Ok(users)
}

pub async fn get_profile(pool: &PgPool, auth: &AuthContext) -> ServiceResult<UserProfile> {
    let user_id = caller_id(auth)?;

    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user_id))?;

    Ok(UserProfile {
        assigned_tasks: Task::list_assigned_to(pool, user_id).await?,
        created_tasks: Task::list_created_by(pool, user_id).await?,
        member_projects: Project::list_member_of(pool, user_id).await?,
        owned_projects: Project::list_owned_by(pool, user_id).await?,
        id: user.id,
        name: user.name,
        created_at: user.created_at,
        updated_at: user.updated_at,
    })
}

/// Renames the caller; a name taken by someone else is a conflict
pub async fn update_profile(
    pool: &PgPool,
    auth: &AuthContext,
    input: UpdateProfileInput,
) -> ServiceResult<UserSummary> {
    let user_id = caller_id(auth)?;
    let name = required_name("name", &input.name)?;

    let user = User::update_name(pool, user_id, &name)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user_id))?;

    tracing::info!(%user_id, "profile updated");
    Ok(user)
}

pub async fn get_stats(pool: &PgPool, auth: &AuthContext) -> ServiceResult<UserStats> {
    let user_id = caller_id(auth)?;

    Ok(UserStats {
        assigned_tasks: Task::count_assigned_to(pool, user_id).await?,
        created_tasks: Task::count_created_by(pool, user_id).await?,
        member_projects: Project::count_member_of(pool, user_id).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_params_defaults() {
        let params: SearchUsersParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.search_term, "");
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_search_params_limit_bounds() {
        for limit in [0, 21, -1] {
            let params: SearchUsersParams =
                serde_json::from_value(json!({"search_term": "a", "limit": limit})).unwrap();
            assert!(params.validate().is_err(), "limit {} should be rejected", limit);
        }

        let params: SearchUsersParams =
            serde_json::from_value(json!({"search_term": "a", "limit": 20})).unwrap();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_update_profile_requires_name() {
        let input: UpdateProfileInput = serde_json::from_value(json!({"name": ""})).unwrap();
        assert!(input.validate().is_err());
    }
}
