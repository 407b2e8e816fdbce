/// Database plumbing shared by the API server and the integration tests
///
/// - `pool`: builds the `PgPool` and answers liveness probes
/// - `migrations`: embedded schema for users, projects, members, tasks and assignees
///
/// ```no_run
/// use taskboard_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::with_url(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
