//! Request handlers.

use crate::api_types::{HealthResponse, QueryRequest, RenameRequest, SyncRequest};
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use dbq_core::{Connection, ConnectionMetadata, QueryResult};
use dbq_runtime::GatewayError;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn sync_metadata(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<ConnectionMetadata>, ApiError> {
    let Json(req) = payload?;
    let url = req.connection_url.trim();
    if url.is_empty() {
        return Err(GatewayError::Validation("connectionUrl must not be empty".into()).into());
    }
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let metadata = state.sync.sync(url, name).await?;
    Ok(Json(metadata))
}

pub async fn list_connections(
    State(state): State<AppState>,
) -> Result<Json<Vec<Connection>>, ApiError> {
    Ok(Json(state.catalog.list_connections().await?))
}

pub async fn get_metadata(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ConnectionMetadata>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.catalog.get_metadata(id).await?))
}

pub async fn rename_connection(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<Connection>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let connection = state.catalog.rename_connection(id, name).await?;
    tracing::info!(connection_id = id, name = ?connection.name, "Connection renamed");
    Ok(Json(connection))
}

pub async fn delete_connection(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.catalog.delete_connection(id).await?;
    tracing::info!(connection_id = id, "Connection deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(req) = payload?;
    let result = state.executor.run_query(req.connection_id, &req.sql).await?;
    Ok(Json(result))
}
