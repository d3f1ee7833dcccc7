use async_trait::async_trait;
use dbq_core::{QueryColumn, TableInfo};
use std::time::Duration;
use thiserror::Error;

/// Rows fetched from an upstream database, in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<QueryColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Failures talking to an upstream database.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The URL scheme is not handled by this adapter, or the URL is malformed.
    #[error("unsupported connection url: {0}")]
    UnsupportedUrl(String),

    /// The server could not be reached or rejected the credentials.
    #[error("{0}")]
    ConnectionFailed(String),

    /// The deadline elapsed before the upstream answered.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream rejected the statement.
    #[error("{0}")]
    QueryFailed(String),
}

#[async_trait]
pub trait UpstreamAdapter: Send + Sync {
    /// Enumerate user tables and views with their columns, ordered by schema,
    /// table, then column position. Must not modify the upstream.
    async fn introspect(&self, connection_url: &str) -> Result<Vec<TableInfo>, UpstreamError>;

    /// Run already-guarded SQL on a dedicated connection and fetch every row.
    /// The connection is released before returning, on success or failure.
    async fn execute(&self, connection_url: &str, sql: &str) -> Result<ResultSet, UpstreamError>;
}
