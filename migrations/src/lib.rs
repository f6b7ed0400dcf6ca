use sqlx::{
    migrate::{MigrateError, Migrator},
    PgPool,
};

static MIGRATOR: Migrator = sqlx::migrate!("./sql");

pub async fn run_all(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
