pub mod schema;

mod connection;
#[cfg(test)]
mod test_helpers;

pub use connection::initialize;
pub use sqlx::{PgPool, Postgres, Transaction};

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("row not found")]
    RowNotFound,
    #[error("constraint violated")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("sql error: {0}")]
    Other(#[from] sqlx::Error),
}

pub trait SqlxResultExt<T> {
    fn map_database_error(self) -> Result<T, DatabaseError>;
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn map_database_error(self) -> Result<T, DatabaseError> {
        self.map_err(|error| match error {
            sqlx::Error::RowNotFound => DatabaseError::RowNotFound,
            sqlx::Error::Database(database_error)
                if matches!(
                    database_error.code().as_deref(),
                    Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION)
                ) =>
            {
                DatabaseError::Conflict
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::Unavailable(error.to_string())
            }
            other => DatabaseError::Other(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DatabaseError, SqlxResultExt};

    #[test]
    fn classifies_missing_rows() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        assert!(matches!(
            result.map_database_error(),
            Err(DatabaseError::RowNotFound)
        ));
    }

    #[test]
    fn classifies_pool_failures_as_unavailable() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        assert!(matches!(
            result.map_database_error(),
            Err(DatabaseError::Unavailable(_))
        ));
    }

    #[test]
    fn passes_other_errors_through() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::WorkerCrashed);
        assert!(matches!(
            result.map_database_error(),
            Err(DatabaseError::Other(sqlx::Error::WorkerCrashed))
        ));
    }
}
