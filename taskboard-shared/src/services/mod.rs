/// Business operations behind the HTTP routes
///
/// Every service function takes the pool and the caller's
/// [`AuthContext`](crate::auth::middleware::AuthContext), runs its access
/// check first, and wraps multi-statement writes in one transaction.
///
/// # Modules
///
/// - `task`: list, board, create, update, status change, delete
/// - `project`: list, detail, create, owner-only update
/// - `user`: member search, profile, stats
/// - `error`: [`ServiceError`]

use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthContext;
use crate::models::user::User;

pub mod error;
pub mod project;
pub mod task;
pub mod user;

pub use error::{ServiceError, ServiceResult};

/// Caller id, refusing a missing or nil id before any query runs
pub(crate) fn caller_id(auth: &AuthContext) -> ServiceResult<Uuid> {
    auth.caller()
        .ok_or_else(|| ServiceError::Forbidden("Invalid userId".to_string()))
}

/// Fails with a validation error naming `field` if any id is not a user
pub(crate) async fn ensure_users_exist(
    conn: &mut PgConnection,
    field: &'static str,
    ids: &[Uuid],
) -> ServiceResult<()> {
    let missing = User::find_missing_ids(conn, ids).await?;
    if missing.is_empty() {
        return Ok(());
    }

    let listed = missing
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    Err(ServiceError::Validation {
        field,
        message: format!("Unknown user ids: {}", listed),
    })
}

/// Trims a name, rejecting one that is blank once trimmed
pub(crate) fn required_name(field: &'static str, raw: &str) -> ServiceResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation {
            field,
            message: "Name cannot be blank".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Drops repeated ids, keeping first occurrence order
pub(crate) fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
