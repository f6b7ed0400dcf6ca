use database::{
    schema::cms::{Article, ArticleView, Author},
    DatabaseError, PgPool, Postgres, SqlxResultExt, Transaction,
};

use super::{Session, Store};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl Store for PgStore {
    async fn find_all_articles(&self) -> Result<Vec<ArticleView>, DatabaseError> {
        ArticleView::list(&self.pool).await.map_database_error()
    }

    async fn find_article_by_id(
        &self,
        article_id: i64,
    ) -> Result<Option<ArticleView>, DatabaseError> {
        ArticleView::load(article_id, &self.pool)
            .await
            .map_database_error()
    }

    async fn find_recent_articles(&self, limit: i64) -> Result<Vec<ArticleView>, DatabaseError> {
        ArticleView::recent(limit, &self.pool)
            .await
            .map_database_error()
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, DatabaseError> {
        Author::list(&self.pool).await.map_database_error()
    }

    async fn begin(&self) -> Result<Box<dyn Session>, DatabaseError> {
        let tx = self.pool.begin().await.map_database_error()?;
        Ok(Box::new(PgSession { tx }))
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[rocket::async_trait]
impl Session for PgSession {
    async fn find_author_by_name(&mut self, name: &str) -> Result<Option<Author>, DatabaseError> {
        Author::find_by_name(name, &mut *self.tx)
            .await
            .map_database_error()
    }

    async fn load_article_for_update(
        &mut self,
        article_id: i64,
    ) -> Result<Option<Article>, DatabaseError> {
        Article::load_for_update(article_id, &mut *self.tx)
            .await
            .map_database_error()
    }

    async fn save_author(&mut self, author: &mut Author) -> Result<(), DatabaseError> {
        author.save(&mut *self.tx).await
    }

    async fn save_article(&mut self, article: &mut Article) -> Result<(), DatabaseError> {
        article.save(&mut *self.tx).await
    }

    async fn delete_article(&mut self, article_id: i64) -> Result<bool, DatabaseError> {
        Article::delete(article_id, &mut *self.tx).await
    }

    async fn purge(&mut self) -> Result<(), DatabaseError> {
        let articles = Article::delete_all(&mut *self.tx).await?;
        let authors = Author::delete_all(&mut *self.tx).await?;
        info!("purged {} articles and {} authors", articles, authors);

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx.commit().await.map_database_error()
    }
}

#[cfg(test)]
mod tests {
    use database::schema::cms::{Article, ArticleView, Author};

    use super::PgSession;
    use crate::{
        setup::demo_fixtures,
        store::{find_or_create_author, Session},
        test_helpers::{self, FIXTURE_TITLES},
    };

    #[rocket::async_test]
    async fn demo_fixtures_put_the_first_three_on_top() -> anyhow::Result<()> {
        let Some(tx) = test_helpers::postgres_transaction().await? else {
            return Ok(());
        };
        let mut session = PgSession { tx };
        demo_fixtures::seed(&mut session, false).await?;

        let recent = ArticleView::recent(3, &mut *session.tx).await?;
        let titles = recent.iter().map(|a| a.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, FIXTURE_TITLES[..3].to_vec());

        demo_fixtures::seed(&mut session, true).await?;
        assert_eq!(Author::list(&mut *session.tx).await?.len(), 4);
        assert_eq!(ArticleView::list(&mut *session.tx).await?.len(), 12);

        session.tx.rollback().await?;
        Ok(())
    }

    #[rocket::async_test]
    async fn sessions_edit_and_delete_through_postgres() -> anyhow::Result<()> {
        let Some(tx) = test_helpers::postgres_transaction().await? else {
            return Ok(());
        };
        let mut session = PgSession { tx };

        let author = find_or_create_author(&mut session, "Session Author").await?;
        assert_eq!(
            find_or_create_author(&mut session, "Session Author").await?,
            author
        );

        let mut kept = Article::new(String::from("kept"), String::from("Body"), author.id);
        session.save_article(&mut kept).await?;
        let mut dropped = Article::new(String::from("dropped"), String::from("Body"), author.id);
        session.save_article(&mut dropped).await?;

        let mut article = session
            .load_article_for_update(kept.id)
            .await?
            .expect("article was saved");
        article.title = String::from("renamed");
        session.save_article(&mut article).await?;

        assert!(session.delete_article(dropped.id).await?);
        assert!(!session.delete_article(dropped.id).await?);

        let remaining = ArticleView::list(&mut *session.tx).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "renamed");
        assert_eq!(remaining[0].author, author);

        session.tx.rollback().await?;
        Ok(())
    }
}
