//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur in catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No connection with this id is registered.
    #[error("Connection not found")]
    NotFound(i64),

    /// An upsert, replace or delete could not be completed. Prior state is
    /// left intact.
    #[error("catalog write failed: {0}")]
    WriteFailed(String),

    /// A read against catalog storage failed.
    #[error("catalog read failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the embedded schema migrations failed.
    #[error("catalog migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The storage directory could not be prepared.
    #[error("catalog storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn write_failed(e: sqlx::Error) -> CatalogError {
    CatalogError::WriteFailed(e.to_string())
}
