//! # Taskboard API Server
//!
//! Serves the project and task API over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskboard \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskboard-api
//! ```

use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::with_url(config.database.url.clone())
    })
    .await?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
