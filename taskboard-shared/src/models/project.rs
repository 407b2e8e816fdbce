/// Project model and database operations
///
/// A project has exactly one owner and a set of members. The owner has access
/// to the project whether or not they appear in `project_members`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::user::UserSummary;

/// Project row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `(id, name)` projection used by the project sidebar and task payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
}

/// Projection used on the profile page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectOverview {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Column changes to write on update
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl ProjectChanges {
    /// Keeps only the requested values that differ from `current`
    pub fn diff(
        current: &Project,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Self {
        Self {
            name: name.filter(|n| *n != current.name),
            description: description.filter(|d| *d != current.description),
        }
    }

    /// True when nothing needs to be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

impl Project {
    /// Inserts a project owned by `data.owner_id`
    pub async fn create(conn: &mut PgConnection, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(conn)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Checks whether `user_id` owns or is a member of `project_id`
    ///
    /// A project that does not exist yields `false`.
    pub async fn is_owner_or_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM projects p
                WHERE p.id = $1
                  AND (
                    p.owner_id = $2
                    OR EXISTS(
                        SELECT 1 FROM project_members pm
                        WHERE pm.project_id = p.id AND pm.user_id = $2
                    )
                  )
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Projects the user owns or is a member of, most recently updated first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.name
            FROM projects p
            WHERE p.owner_id = $1
               OR EXISTS(
                    SELECT 1 FROM project_members pm
                    WHERE pm.project_id = p.id AND pm.user_id = $1
               )
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Projects owned by the user
    pub async fn list_owned_by(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectOverview>, sqlx::Error> {
        sqlx::query_as::<_, ProjectOverview>(
            r#"
            SELECT id, name, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Projects listing the user in `project_members`
    pub async fn list_member_of(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ProjectOverview>, sqlx::Error> {
        sqlx::query_as::<_, ProjectOverview>(
            r#"
            SELECT p.id, p.name, p.created_at
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Counts projects listing the user in `project_members`
    pub async fn count_member_of(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Members of a project, by name
    pub async fn members<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Adds members, ignoring ones already present
    pub async fn add_members(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_ids)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Replaces the whole membership set with `user_ids`
    ///
    /// An empty slice removes every member.
    pub async fn replace_members(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;

        Self::add_members(conn, project_id, user_ids).await
    }

    /// Writes the given column changes and bumps `updated_at`
    ///
    /// Returns `None` if the project does not exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, description, owner_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }

        q.fetch_optional(conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Apollo".to_string(),
            description: Some("Moon".to_string()),
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_diff_same_values_is_empty() {
        let project = stored();
        let changes = ProjectChanges::diff(
            &project,
            Some("Apollo".to_string()),
            Some(Some("Moon".to_string())),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_diff_absent_values_is_empty() {
        let changes = ProjectChanges::diff(&stored(), None, None);
        assert_eq!(changes, ProjectChanges::default());
    }

    #[test]
    fn test_diff_keeps_changed_name() {
        let changes = ProjectChanges::diff(&stored(), Some("Gemini".to_string()), None);
        assert_eq!(changes.name.as_deref(), Some("Gemini"));
        assert!(changes.description.is_none());
    }

    #[test]
    fn test_diff_clears_description() {
        let changes = ProjectChanges::diff(&stored(), None, Some(None));
        assert_eq!(changes.description, Some(None));
        assert!(!changes.is_empty());
    }
}
