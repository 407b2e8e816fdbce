/// Schema migrations
///
/// The SQL files under the workspace `migrations/` directory are embedded at
/// compile time with `sqlx::migrate!`. Each migration is a reversible pair:
/// `{version}_{name}.up.sql` and `{version}_{name}.down.sql`.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Highest applied version, if any
    pub latest_version: Option<i64>,
}

/// Applies every pending migration
///
/// # Errors
///
/// Returns an error if a migration fails to apply; sqlx rolls back the failed
/// migration's transaction.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("applying database migrations");

    sqlx::migrate!("../migrations").run(pool).await.map_err(|e| {
        warn!(error = %e, "migration failed");
        e
    })?;

    info!("database schema is up to date");
    Ok(())
}

/// Reads `_sqlx_migrations` to report what has been applied
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let table: Option<String> = sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations')::text")
        .fetch_one(pool)
        .await?;

    if table.is_none() {
        debug!("no migrations applied yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) =
        sqlx::query_as("SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        applied_migrations: usize::try_from(count).unwrap_or_default(),
        latest_version,
    })
}

/// Creates the database named in `database_url` when it is missing
///
/// Used by local development and the integration test harness.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        return Ok(());
    }

    info!("creating missing database");
    Postgres::create_database(database_url).await
}
