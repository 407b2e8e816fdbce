/// Error type shared by all services
///
/// Each variant maps to one HTTP status in the API server.

use crate::auth::authorization::AuthzError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Caller lacks access, or is not the owner/creator where required
    #[error("{0}")]
    Forbidden(String),

    /// Referenced project or task does not exist
    #[error("{0}")]
    NotFound(String),

    /// Business-level input failure, such as an unknown assignee id
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Unique constraint violation
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: &str, id: uuid::Uuid) -> Self {
        ServiceError::NotFound(format!("{} {} not found", what, id))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = match db_err.constraint() {
                    Some("users_name_key") => "Name is already taken".to_string(),
                    Some(constraint) => format!("Constraint violation: {}", constraint),
                    None => "Duplicate value".to_string(),
                };
                return ServiceError::Conflict(message);
            }
        }

        ServiceError::Database(err)
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::TaskNotFound(_) | AuthzError::ProjectNotFound(_) => {
                ServiceError::NotFound(err.to_string())
            }
            AuthzError::DatabaseError(e) => ServiceError::from(e),
            AuthzError::Forbidden(_) | AuthzError::NotOwner | AuthzError::NotCreator => {
                ServiceError::Forbidden(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_from_authz_error() {
        let id = Uuid::new_v4();

        assert!(matches!(
            ServiceError::from(AuthzError::TaskNotFound(id)),
            ServiceError::NotFound(msg) if msg.contains(&id.to_string())
        ));
        assert!(matches!(
            ServiceError::from(AuthzError::NotOwner),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            ServiceError::from(AuthzError::Forbidden("Invalid userId".to_string())),
            ServiceError::Forbidden(msg) if msg == "Invalid userId"
        ));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        assert!(matches!(
            ServiceError::from(sqlx::Error::RowNotFound),
            ServiceError::Database(_)
        ));
    }

    #[test]
    fn test_validation_display() {
        let err = ServiceError::Validation {
            field: "assignee_ids",
            message: "unknown user".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid assignee_ids: unknown user");
    }
}
