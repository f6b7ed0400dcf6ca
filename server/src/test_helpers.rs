use std::{env, sync::Arc};

use database::{
    schema::cms::{Article, Author},
    Postgres, Transaction,
};
use rocket::local::asynchronous::Client;

use crate::{setup::demo_fixtures, store::MemoryStore, webserver::rocket_server};

/// Demo article titles, newest first.
pub const FIXTURE_TITLES: [&str; 6] = [
    "Introduction au Design Glassmorphique",
    "Symfony 6 : Les Nouveautés",
    "UX Design : Principes Fondamentaux",
    "Gestion de Projet Agile",
    "Bootstrap 5 : Guide Complet",
    "Accessibilité Web : Bonnes Pratiques",
];

pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    demo_fixtures::load(&store, false)
        .await
        .expect("demo fixtures load into an empty store");
    store
}

/// A client for a server backed by `store`. The store is shared, so tests can
/// inspect it after dispatching requests.
pub async fn client(store: MemoryStore) -> Client {
    Client::tracked(rocket_server(Arc::new(store)))
        .await
        .expect("valid rocket instance")
}

/// A transaction on an emptied, migrated `DATABASE_URL`, or `None` when no
/// database is configured. Tests roll it back when they finish.
pub async fn postgres_transaction() -> anyhow::Result<Option<Transaction<'static, Postgres>>> {
    let _ = dotenv::dotenv();
    let database_url = match env::var("DATABASE_URL") {
        Ok(database_url) => database_url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping postgres test");
            return Ok(None);
        }
    };

    let pool = database::initialize(&database_url).await?;
    let mut tx = pool.begin().await?;
    Article::delete_all(&mut *tx).await?;
    Author::delete_all(&mut *tx).await?;

    Ok(Some(tx))
}
