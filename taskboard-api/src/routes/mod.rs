/// API route handlers
///
/// Handlers validate request shape, then call into
/// `taskboard_shared::services`, which run the access checks.
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login, refresh
/// - `projects`: Project list, detail, create, update
/// - `tasks`: Task list, board, create, update, status, delete
/// - `users`: Member search, profile, stats

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
