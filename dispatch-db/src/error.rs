//! Error types for the persistent store.

use thiserror::Error;

/// Errors that can occur when using the store gateway.
#[derive(Error, Debug)]
pub enum DbError {
    /// Database connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query error: {0}")]
    Query(String),

    /// Database error from SeaORM.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for store operations.
pub type DbResult<T> = Result<T, DbError>;

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl DbError {
    /// Transient errors (connection drops, pool exhaustion, statement
    /// timeouts) are worth a bounded retry by the caller; everything else is
    /// a logic or data error the caller should surface.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::Connection(_) => true,
            DbError::Database(inner) => matches!(
                inner,
                sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
            ),
            _ => false,
        }
    }
}
