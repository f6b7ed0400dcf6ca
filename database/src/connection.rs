use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};

const MAX_CONNECTIONS: u32 = 10;

pub async fn connect(database_url: &str) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Connects and applies any pending migrations before handing out the pool.
pub async fn initialize(database_url: &str) -> Result<PgPool, MigrateError> {
    let pool = connect(database_url).await?;
    migrations::run_all(&pool).await?;
    log::info!("database migrations are up to date");

    Ok(pool)
}
