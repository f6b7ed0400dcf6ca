use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::{schema::cms::Author, DatabaseError, SqlxResultExt};

pub const DEFAULT_RECENT_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub author_id: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum ArticleError {
    #[error("article not found")]
    ArticleNotFound,
    #[error("a title is required")]
    MissingTitle,
    #[error("content is required")]
    MissingContent,
    #[error("an author is required")]
    MissingAuthor,
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl Article {
    pub fn new(title: String, content: String, author_id: i64) -> Self {
        Self {
            id: 0,
            title,
            content,
            author_id,
            published_at: Utc::now(),
        }
    }

    /// Returns the trimmed title and the untouched content, rejecting blank values.
    pub fn cleanup_and_validate(
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<(String, String), ArticleError> {
        let title = title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(ArticleError::MissingTitle)?;
        let content = content
            .filter(|content| !content.trim().is_empty())
            .ok_or(ArticleError::MissingContent)?;

        Ok((title.to_owned(), content.to_owned()))
    }

    pub async fn load_for_update<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        article_id: i64,
        executor: E,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, title, content, published_at, author_id FROM articles WHERE id = $1 FOR UPDATE",
        )
        .bind(article_id)
        .fetch_optional(executor)
        .await
    }

    /// Inserts new articles. Existing articles only ever have their title and
    /// content rewritten; the author and publication time are fixed at creation.
    pub async fn save<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        &mut self,
        executor: E,
    ) -> Result<(), DatabaseError> {
        if self.id == 0 {
            let (id,): (i64,) = sqlx::query_as(
                r#"INSERT INTO articles (
                    title,
                    content,
                    published_at,
                    author_id
                   ) VALUES ($1, $2, $3, $4) RETURNING id"#,
            )
            .bind(&self.title)
            .bind(&self.content)
            .bind(self.published_at)
            .bind(self.author_id)
            .fetch_one(executor)
            .await
            .map_database_error()?;

            self.id = id;
        } else {
            let result = sqlx::query(
                r#"UPDATE articles SET
                    title = $2,
                    content = $3
                   WHERE id = $1"#,
            )
            .bind(self.id)
            .bind(&self.title)
            .bind(&self.content)
            .execute(executor)
            .await
            .map_database_error()?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::RowNotFound);
            }
        }

        Ok(())
    }

    pub async fn delete<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        article_id: i64,
        executor: E,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(article_id)
            .execute(executor)
            .await
            .map_database_error()?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        executor: E,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM articles")
            .execute(executor)
            .await
            .map_database_error()?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub author: Author,
}

impl ArticleView {
    pub fn new(article: Article, author: Author) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            published_at: article.published_at,
            author,
        }
    }

    pub async fn list<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        executor: E,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!("{} ORDER BY articles.id", VIEW_SELECT))
            .fetch_all(executor)
            .await
    }

    pub async fn load<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        article_id: i64,
        executor: E,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("{} WHERE articles.id = $1", VIEW_SELECT))
            .bind(article_id)
            .fetch_optional(executor)
            .await
    }

    /// Most recently published first. A non-positive `limit` yields nothing.
    pub async fn recent<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        limit: i64,
        executor: E,
    ) -> sqlx::Result<Vec<Self>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Self>(&format!(
            "{} ORDER BY articles.published_at DESC, articles.id DESC LIMIT $1",
            VIEW_SELECT
        ))
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

const VIEW_SELECT: &str = r#"SELECT
    articles.id,
    articles.title,
    articles.content,
    articles.published_at,
    authors.id as author_id,
    authors.name as author_name,
    authors.description as author_description
   FROM articles
   INNER JOIN authors ON authors.id = articles.author_id"#;

impl<'r> FromRow<'r, PgRow> for ArticleView {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            published_at: row.try_get("published_at")?,
            author: Author {
                id: row.try_get("author_id")?,
                name: row.try_get("author_name")?,
                description: row.try_get("author_description")?,
            },
        })
    }
}
