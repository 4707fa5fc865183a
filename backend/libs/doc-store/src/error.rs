/// Error types for document store operations
use crate::DocRef;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(DocRef),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
