use anyhow::Result;
use sqlx::PgPool;

/// Apply the schema in `./migrations` (profiles, patterns, connections, requests).
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}
