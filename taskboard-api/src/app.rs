/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::middleware::authenticate_bearer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through `State`; the config sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/                      public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /projects/                  JWT
///     │   ├── GET, POST /
///     │   ├── GET, PATCH /:id
///     │   └── GET /:id/users
///     ├── /tasks/                     JWT
///     │   ├── GET, POST /
///     │   ├── GET /board
///     │   ├── PATCH, DELETE /:id
///     │   └── PUT /:id/status
///     └── /users/                     JWT
///         ├── GET, PATCH /me
///         └── GET /me/stats
/// ```
///
/// Layers, outermost first: CORS, request tracing, then per-group JWT auth.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project).patch(routes::projects::update_project),
        )
        .route("/:id/users", get(routes::users::search_project_users));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/board", get(routes::tasks::task_board))
        .route(
            "/:id",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/:id/status", put(routes::tasks::change_task_status));

    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::get_profile).patch(routes::users::update_profile),
        )
        .route("/me/stats", get(routes::users::get_stats));

    let protected_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Validates the bearer token and inserts the caller's `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate_bearer(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, "authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
