use std::env;

use sqlx::{Postgres, Transaction};

use crate::schema::cms::{Article, Author};

/// Opens a transaction on an emptied, migrated `DATABASE_URL`. Tests roll it
/// back when they finish. Returns `None` when no database is configured.
pub async fn transaction() -> anyhow::Result<Option<Transaction<'static, Postgres>>> {
    let _ = dotenv::dotenv();
    let database_url = match env::var("DATABASE_URL") {
        Ok(database_url) => database_url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping postgres test");
            return Ok(None);
        }
    };

    let pool = crate::initialize(&database_url).await?;
    let mut tx = pool.begin().await?;
    Article::delete_all(&mut *tx).await?;
    Author::delete_all(&mut *tx).await?;

    Ok(Some(tx))
}
