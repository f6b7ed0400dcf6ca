use anyhow::Context;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    database::initialize(&database_url)
        .await
        .context("error applying migrations")?;

    Ok(())
}
