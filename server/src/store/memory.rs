use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, RwLock,
    },
};

use database::{
    schema::cms::{Article, ArticleView, Author},
    DatabaseError,
};

use super::{Session, Store};

#[derive(Debug, Clone, Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    articles: BTreeMap<i64, Article>,
}

/// Staged author ids that turned out to name an already stored author.
type Aliases = BTreeMap<i64, i64>;

impl Tables {
    fn view(&self, article: &Article) -> Option<ArticleView> {
        let author = self.authors.get(&article.author_id)?;
        Some(ArticleView::new(article.clone(), author.clone()))
    }

    fn author_named(&self, name: &str) -> Option<&Author> {
        self.authors.values().find(|author| author.name == name)
    }

    fn apply(&mut self, change: &Change, aliases: &mut Aliases) -> Result<(), DatabaseError> {
        match change {
            Change::InsertAuthor(author) => match self.author_named(&author.name).map(|a| a.id) {
                Some(existing) => {
                    aliases.insert(author.id, existing);
                }
                None => {
                    self.authors.insert(author.id, author.clone());
                }
            },
            Change::UpdateAuthor(author) => {
                if self
                    .author_named(&author.name)
                    .map_or(false, |other| other.id != author.id)
                {
                    return Err(DatabaseError::Conflict);
                }
                let existing = self
                    .authors
                    .get_mut(&author.id)
                    .ok_or(DatabaseError::RowNotFound)?;
                *existing = author.clone();
            }
            Change::InsertArticle(article) => {
                let mut article = article.clone();
                if let Some(author_id) = aliases.get(&article.author_id) {
                    article.author_id = *author_id;
                }
                if !self.authors.contains_key(&article.author_id) {
                    return Err(DatabaseError::Conflict);
                }
                self.articles.insert(article.id, article);
            }
            Change::UpdateArticle(article) => {
                let existing = self
                    .articles
                    .get_mut(&article.id)
                    .ok_or(DatabaseError::RowNotFound)?;
                existing.title = article.title.clone();
                existing.content = article.content.clone();
            }
            Change::DeleteArticle(article_id) => {
                self.articles.remove(article_id);
            }
            Change::Purge => {
                self.articles.clear();
                self.authors.clear();
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
enum Change {
    InsertAuthor(Author),
    UpdateAuthor(Author),
    InsertArticle(Article),
    UpdateArticle(Article),
    DeleteArticle(i64),
    Purge,
}

/// Keeps everything in process. Identifiers come from one sequence shared
/// by both tables and are never reused, even when a session is discarded.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    sequence: Arc<AtomicI64>,
}

impl MemoryStore {
    fn snapshot(&self) -> Result<Tables, DatabaseError> {
        self.tables
            .read()
            .map(|tables| tables.clone())
            .map_err(|_| DatabaseError::Unavailable(String::from("memory store lock poisoned")))
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn find_all_articles(&self) -> Result<Vec<ArticleView>, DatabaseError> {
        let tables = self.snapshot()?;
        Ok(tables
            .articles
            .values()
            .filter_map(|article| tables.view(article))
            .collect())
    }

    async fn find_article_by_id(
        &self,
        article_id: i64,
    ) -> Result<Option<ArticleView>, DatabaseError> {
        let tables = self.snapshot()?;
        Ok(tables
            .articles
            .get(&article_id)
            .and_then(|article| tables.view(article)))
    }

    async fn find_recent_articles(&self, limit: i64) -> Result<Vec<ArticleView>, DatabaseError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut articles = self.find_all_articles().await?;
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        articles.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(articles)
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, DatabaseError> {
        let mut authors = self
            .snapshot()?
            .authors
            .into_values()
            .collect::<Vec<_>>();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(authors)
    }

    async fn begin(&self) -> Result<Box<dyn Session>, DatabaseError> {
        Ok(Box::new(MemorySession {
            working: self.snapshot()?,
            changes: Vec::new(),
            store: self.clone(),
        }))
    }
}

struct MemorySession {
    store: MemoryStore,
    working: Tables,
    changes: Vec<Change>,
}

impl MemorySession {
    fn record(&mut self, change: Change) -> Result<(), DatabaseError> {
        self.working.apply(&change, &mut Aliases::new())?;
        self.changes.push(change);

        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.store.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[rocket::async_trait]
impl Session for MemorySession {
    async fn find_author_by_name(&mut self, name: &str) -> Result<Option<Author>, DatabaseError> {
        Ok(self.working.author_named(name).cloned())
    }

    async fn load_article_for_update(
        &mut self,
        article_id: i64,
    ) -> Result<Option<Article>, DatabaseError> {
        Ok(self.working.articles.get(&article_id).cloned())
    }

    async fn save_author(&mut self, author: &mut Author) -> Result<(), DatabaseError> {
        if author.id != 0 {
            if !self.working.authors.contains_key(&author.id) {
                return Err(DatabaseError::RowNotFound);
            }
            return self.record(Change::UpdateAuthor(author.clone()));
        }

        if let Some(existing) = self.working.author_named(&author.name) {
            author.id = existing.id;
            author.description = existing.description.clone();
            return Ok(());
        }

        author.id = self.next_id();
        self.record(Change::InsertAuthor(author.clone()))
    }

    async fn save_article(&mut self, article: &mut Article) -> Result<(), DatabaseError> {
        if article.id == 0 {
            let mut inserted = article.clone();
            inserted.id = self.next_id();
            self.record(Change::InsertArticle(inserted.clone()))?;
            article.id = inserted.id;
            Ok(())
        } else {
            self.record(Change::UpdateArticle(article.clone()))
        }
    }

    async fn delete_article(&mut self, article_id: i64) -> Result<bool, DatabaseError> {
        let existed = self.working.articles.contains_key(&article_id);
        if existed {
            self.record(Change::DeleteArticle(article_id))?;
        }

        Ok(existed)
    }

    async fn purge(&mut self) -> Result<(), DatabaseError> {
        self.record(Change::Purge)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let mut tables = self
            .store
            .tables
            .write()
            .map_err(|_| DatabaseError::Unavailable(String::from("memory store lock poisoned")))?;

        // Replay onto a copy so a failing change leaves the store untouched.
        // Authors another session stored meanwhile win over staged ones.
        let mut committed = tables.clone();
        let mut aliases = Aliases::new();
        for change in &self.changes {
            committed.apply(change, &mut aliases)?;
        }
        *tables = committed;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use database::{
        schema::cms::{Article, Author},
        DatabaseError,
    };

    use super::MemoryStore;
    use crate::store::{find_or_create_author, Session, Store};

    async fn seed_article(
        store: &MemoryStore,
        title: &str,
        days_ago: i64,
    ) -> Result<Article, DatabaseError> {
        let mut session = store.begin().await?;
        let author = find_or_create_author(session.as_mut(), "Marie Dubois").await?;
        let mut article = Article::new(title.to_owned(), String::from("Body"), author.id);
        article.published_at = Utc::now() - Duration::days(days_ago);
        session.save_article(&mut article).await?;
        session.commit().await?;

        Ok(article)
    }

    #[rocket::async_test]
    async fn recent_articles_are_newest_first_and_limited() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        seed_article(&store, "oldest", 5).await?;
        seed_article(&store, "newest", 1).await?;
        seed_article(&store, "middle", 3).await?;

        let recent = store.find_recent_articles(2).await?;
        let titles = recent.iter().map(|a| a.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["newest", "middle"]);

        let everything = store.find_recent_articles(10).await?;
        assert_eq!(everything.len(), 3);
        assert!(everything
            .windows(2)
            .all(|pair| pair[0].published_at >= pair[1].published_at));

        Ok(())
    }

    #[rocket::async_test]
    async fn non_positive_limits_return_nothing() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        seed_article(&store, "only", 1).await?;

        assert!(store.find_recent_articles(0).await?.is_empty());
        assert!(store.find_recent_articles(-3).await?.is_empty());

        Ok(())
    }

    #[rocket::async_test]
    async fn dropped_sessions_leave_no_trace() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        {
            let mut session = store.begin().await?;
            let mut author = Author::new("Jean Martin", None);
            session.save_author(&mut author).await?;
            let mut article = Article::new(String::from("draft"), String::from("Body"), author.id);
            session.save_article(&mut article).await?;
            assert!(session.load_article_for_update(article.id).await?.is_some());
        }

        assert!(store.find_all_articles().await?.is_empty());
        assert!(store.find_all_authors().await?.is_empty());

        Ok(())
    }

    #[rocket::async_test]
    async fn articles_need_an_existing_author() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        let mut session = store.begin().await?;
        let mut article = Article::new(String::from("orphan"), String::from("Body"), 42);

        assert!(matches!(
            session.save_article(&mut article).await,
            Err(DatabaseError::Conflict)
        ));
        session.commit().await?;
        assert!(store.find_all_articles().await?.is_empty());

        Ok(())
    }

    #[rocket::async_test]
    async fn updates_only_touch_title_and_content() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        let original = seed_article(&store, "before", 2).await?;

        let mut session = store.begin().await?;
        let mut article = session
            .load_article_for_update(original.id)
            .await?
            .expect("article exists");
        article.title = String::from("after");
        article.content = String::from("New body");
        article.author_id = 999;
        article.published_at = Utc::now();
        session.save_article(&mut article).await?;
        session.commit().await?;

        let stored = store
            .find_article_by_id(original.id)
            .await?
            .expect("article still exists");
        assert_eq!(stored.title, "after");
        assert_eq!(stored.content, "New body");
        assert_eq!(stored.author.id, original.author_id);
        assert_eq!(stored.published_at, original.published_at);

        Ok(())
    }

    #[rocket::async_test]
    async fn deleting_removes_exactly_one_article() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        let first = seed_article(&store, "first", 2).await?;
        let second = seed_article(&store, "second", 1).await?;

        let mut session = store.begin().await?;
        assert!(session.delete_article(first.id).await?);
        assert!(!session.delete_article(first.id).await?);
        session.commit().await?;

        assert!(store.find_article_by_id(first.id).await?.is_none());
        let remaining = store.find_all_articles().await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);

        Ok(())
    }

    #[rocket::async_test]
    async fn purge_empties_both_tables() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        seed_article(&store, "first", 2).await?;

        let mut session = store.begin().await?;
        session.purge().await?;
        session.commit().await?;

        assert!(store.find_all_articles().await?.is_empty());
        assert!(store.find_all_authors().await?.is_empty());

        Ok(())
    }

    #[rocket::async_test]
    async fn concurrent_sessions_share_one_author_per_name() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        let mut first = store.begin().await?;
        let mut second = store.begin().await?;

        let mut articles = Vec::new();
        for session in [&mut first, &mut second] {
            let author = find_or_create_author(session.as_mut(), "Alice").await?;
            let mut article = Article::new(String::from("Hello"), String::from("Body"), author.id);
            session.save_article(&mut article).await?;
            articles.push(article.id);
        }
        first.commit().await?;
        second.commit().await?;

        let authors = store.find_all_authors().await?;
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "Alice");
        for article_id in articles {
            let article = store
                .find_article_by_id(article_id)
                .await?
                .expect("both articles are stored");
            assert_eq!(article.author, authors[0]);
        }

        Ok(())
    }

    #[rocket::async_test]
    async fn saving_a_taken_name_adopts_the_stored_author() -> anyhow::Result<()> {
        let store = MemoryStore::default();
        let mut session = store.begin().await?;
        let mut original = Author::new("Sophie Laurent", Some(String::from("Designer UX/UI")));
        session.save_author(&mut original).await?;

        let mut again = Author::new("Sophie Laurent", None);
        session.save_author(&mut again).await?;
        assert_eq!(again, original);

        let mut other = Author::new("Pierre Durand", None);
        session.save_author(&mut other).await?;
        other.name = String::from("Sophie Laurent");
        session.commit().await?;

        let mut session = store.begin().await?;
        assert!(matches!(
            session.save_author(&mut other).await,
            Err(DatabaseError::Conflict)
        ));
        assert_eq!(store.find_all_authors().await?.len(), 2);

        Ok(())
    }
}
