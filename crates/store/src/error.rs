use domain::UnknownCode;
use thiserror::Error;

/// Errors that can occur when reading or writing through a unit of work.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update or delete targeted a row that does not exist.
    #[error("{entity} not found: {id}")]
    RowNotFound { entity: &'static str, id: i64 },

    /// A write would break referential integrity or a uniqueness rule,
    /// e.g. deleting a row that other rows still reference.
    #[error("Integrity violation: {0}")]
    Conflict(String),

    /// The entity was never inserted, so it has no identifier to update.
    #[error("{0} has not been persisted")]
    Unpersisted(&'static str),

    /// A stored value could not be turned back into a domain value.
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Client-facing detail for a rejected write. The database message is only logged.
pub const CONSTRAINT_VIOLATION: &str = "Database constraint violation";

impl StoreError {
    pub fn row_not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        StoreError::RowNotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_foreign_key_violation()
                || db_err.is_unique_violation()
                || db_err.is_check_violation())
        {
            tracing::warn!(
                constraint = db_err.constraint().unwrap_or_default(),
                error = %db_err,
                "constraint violation"
            );
            return StoreError::Conflict(CONSTRAINT_VIOLATION.to_string());
        }
        StoreError::Database(err)
    }
}

impl From<UnknownCode> for StoreError {
    fn from(err: UnknownCode) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
