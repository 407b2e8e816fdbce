/// User model and database operations
///
/// Users sign in with a unique display name and a password. They own projects,
/// are members of projects, author tasks and are assigned to tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "jsmith".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_name(&pool, "jsmith").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// User account
///
/// `password_hash` is an Argon2id PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name, also the login name
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Minimal user projection embedded in tasks and pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login/display name (must be unique)
    pub name: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_name_key` if the name is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, password_hash)
            VALUES ($1, $2)
            RETURNING id, name, password_hash, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by exact login name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, created_at, updated_at
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Overwrites the display name
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update_name(
        pool: &PgPool,
        id: Uuid,
        name: &str,
    ) -> Result<Option<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            UPDATE users
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Returns the subset of `ids` that do not belong to any user
    ///
    /// Used to reject assignee and member lists before connecting them.
    pub async fn find_missing_ids(
        conn: &mut PgConnection,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar(
            r#"
            SELECT requested.id
            FROM UNNEST($1::uuid[]) AS requested(id)
            WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = requested.id)
            "#,
        )
        .bind(ids)
        .fetch_all(conn)
        .await
    }

    /// Case-insensitive substring search over members of a project
    ///
    /// `term` is matched literally: LIKE wildcards in it are escaped.
    pub async fn search_project_members(
        pool: &PgPool,
        project_id: Uuid,
        term: &str,
        limit: i64,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name
            FROM users u
            JOIN project_members pm ON pm.user_id = u.id
            WHERE pm.project_id = $1
              AND u.name ILIKE $2 ESCAPE '\'
            ORDER BY u.name
            LIMIT $3
            "#,
        )
        .bind(project_id)
        .bind(contains_pattern(term))
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

/// Builds an ILIKE pattern matching `term` anywhere, with `\`, `%` and `_` escaped
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_plain() {
        assert_eq!(contains_pattern("ali"), "%ali%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("x\\y"), "%x\\\\y%");
    }

    #[test]
    fn test_user_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "jsmith".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("jsmith"));
        assert!(!json.contains("argon2id"));
    }
}
