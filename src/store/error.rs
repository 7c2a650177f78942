//! Store error types

use thiserror::Error;

/// Errors reported by [`super::Store`] and [`super::UnitOfWork`] implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Row missing, or a referenced row missing (foreign key violation on insert).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated, or a delete blocked by dependent rows.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            StoreError::NotFound(_) => 404,
            StoreError::Conflict(_) => 403,
            StoreError::Database(_) => 500,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    StoreError::Conflict(db_err.message().to_string())
                } else if db_err.is_foreign_key_violation() {
                    StoreError::NotFound(db_err.message().to_string())
                } else {
                    StoreError::Database(e.to_string())
                }
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}
