//! API request types. Responses reuse the `dbq_core` models directly.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/metadata/sync`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub connection_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `PUT /api/metadata/{id}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /api/query`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub connection_id: i64,
    pub sql: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
