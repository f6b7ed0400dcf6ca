use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{DatabaseError, SqlxResultExt};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description,
        }
    }

    /// Trims the submitted name, returning `None` when nothing is left.
    pub fn cleanup_name(name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        }
    }

    pub async fn list<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        executor: E,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, name, description FROM authors ORDER BY name, id")
            .fetch_all(executor)
            .await
    }

    pub async fn find_by_name<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        name: &str,
        executor: E,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, name, description FROM authors WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    /// Inserts new authors, or updates existing ones. Names are unique: saving a
    /// new author whose name is already taken adopts the stored row instead.
    pub async fn save<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        &mut self,
        executor: E,
    ) -> Result<(), DatabaseError> {
        if self.id == 0 {
            let (id, description): (i64, Option<String>) = sqlx::query_as(
                r#"INSERT INTO authors (name, description) VALUES ($1, $2)
                   ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                   RETURNING id, description"#,
            )
            .bind(&self.name)
            .bind(self.description.as_ref())
            .fetch_one(executor)
            .await
            .map_database_error()?;

            self.id = id;
            self.description = description;
        } else {
            let result = sqlx::query("UPDATE authors SET name = $2, description = $3 WHERE id = $1")
                .bind(self.id)
                .bind(&self.name)
                .bind(self.description.as_ref())
                .execute(executor)
                .await
                .map_database_error()?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::RowNotFound);
            }
        }

        Ok(())
    }

    pub async fn delete_all<'e, E: sqlx::Executor<'e, Database = sqlx::Postgres>>(
        executor: E,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM authors")
            .execute(executor)
            .await
            .map_database_error()?;
        Ok(result.rows_affected())
    }
}
