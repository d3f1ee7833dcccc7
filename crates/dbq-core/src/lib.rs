//! # dbq-core
//!
//! Types shared by every dbq crate: the catalog records (`Connection`,
//! `TableInfo`), the guard output (`GuardedQuery`), the normalized result
//! returned to clients (`QueryResult`), and the gateway configuration.
//!
//! All types serialize with camelCase field names, which is the wire shape
//! exposed by `dbq-server`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod redact;

pub use config::{
    CatalogConfig, ConfigError, GatewayConfig, LoggingConfig, ServerConfig, UpstreamLimits,
};
pub use redact::redact_url;

/// Row cap attached to queries that arrive without a `LIMIT`.
pub const MAX_ROWS: u64 = 1000;

/// Message returned alongside results whose SQL received the automatic cap.
pub const LIMIT_APPLIED_MESSAGE: &str = "LIMIT 1000 applied automatically";

/// A registered upstream database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: i64,
    pub name: Option<String>,
    /// Physical address. Unique across the catalog.
    pub connection_url: String,
    pub created_at: DateTime<Utc>,
    /// `None` until the first successful sync.
    pub last_synced: Option<DateTime<Utc>>,
}

/// A column as reported by the upstream system catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A table or view captured during introspection.
///
/// Columns are kept in the upstream ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub is_view: bool,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// `schema.name`, as it would be written in SQL.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A connection together with its last-known schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMetadata {
    pub connection: Connection,
    pub tables: Vec<TableInfo>,
}

/// Output of the SQL guard: the SQL that will actually run upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardedQuery {
    pub patched_sql: String,
    pub limit_added: bool,
}

/// Column descriptor in a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryColumn {
    pub name: String,
    /// Upstream type name, best effort.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl QueryColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }
}

/// Normalized tabular result of a guarded query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<QueryColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub limit_added: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
