use std::sync::Arc;

use database::{
    schema::cms::{Article, ArticleView, Author},
    DatabaseError,
};

mod memory;
mod postgres;

pub use self::{memory::MemoryStore, postgres::PgStore};

pub type SharedStore = Arc<dyn Store>;

/// Read access to articles and authors, plus the entry point for writes.
#[rocket::async_trait]
pub trait Store: Send + Sync + 'static {
    async fn find_all_articles(&self) -> Result<Vec<ArticleView>, DatabaseError>;
    async fn find_article_by_id(&self, article_id: i64)
        -> Result<Option<ArticleView>, DatabaseError>;
    async fn find_recent_articles(&self, limit: i64) -> Result<Vec<ArticleView>, DatabaseError>;
    async fn find_all_authors(&self) -> Result<Vec<Author>, DatabaseError>;

    async fn begin(&self) -> Result<Box<dyn Session>, DatabaseError>;
}

/// A unit of work. Nothing is visible to other sessions until `commit`,
/// and dropping a session discards its changes.
#[rocket::async_trait]
pub trait Session: Send {
    async fn find_author_by_name(&mut self, name: &str) -> Result<Option<Author>, DatabaseError>;
    async fn load_article_for_update(
        &mut self,
        article_id: i64,
    ) -> Result<Option<Article>, DatabaseError>;

    async fn save_author(&mut self, author: &mut Author) -> Result<(), DatabaseError>;
    async fn save_article(&mut self, article: &mut Article) -> Result<(), DatabaseError>;
    async fn delete_article(&mut self, article_id: i64) -> Result<bool, DatabaseError>;
    /// Removes every article and author.
    async fn purge(&mut self) -> Result<(), DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}

/// Returns the author called `name`, creating it when there is none. Both
/// stores keep names unique, so concurrent sessions end up sharing one row.
pub async fn find_or_create_author(
    session: &mut dyn Session,
    name: &str,
) -> Result<Author, DatabaseError> {
    if let Some(author) = session.find_author_by_name(name).await? {
        return Ok(author);
    }

    let mut author = Author::new(name, None);
    session.save_author(&mut author).await?;
    Ok(author)
}

pub async fn connect(database_url: Option<&str>) -> anyhow::Result<SharedStore> {
    match database_url {
        Some(database_url) => {
            let pool = database::initialize(database_url).await?;
            info!("using postgres store");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}
