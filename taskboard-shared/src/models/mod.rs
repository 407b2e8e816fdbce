/// Database models for Taskboard
///
/// # Models
///
/// - `user`: Accounts, login lookup and member search
/// - `project`: Projects, ownership and membership
/// - `task`: Tasks, assignees and list queries
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::project::Project;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// for project in Project::list_for_user(&pool, user_id).await? {
///     println!("{} {}", project.id, project.name);
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Deserializer};

pub mod project;
pub mod task;
pub mod user;

/// Deserializes a field that distinguishes "absent" from "null"
///
/// Use with `#[serde(default, deserialize_with = "deserialize_nullable")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)` and a value becomes `Some(Some(value))`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
