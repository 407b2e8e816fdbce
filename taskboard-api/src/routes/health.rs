/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```
///
/// Responds 503 with `"status": "degraded"` when the database is unreachable.

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::db::pool::health_check as ping_database;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = match ping_database(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            false
        }
    };

    let (status, label, database) = if connected {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}
