//! HTTP error envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dbq_catalog::CatalogError;
use dbq_runtime::GatewayError;
use serde::Serialize;

const INTERNAL_DETAIL: &str = "Internal server error";
const CATALOG_WRITE_DETAIL: &str = "Failed to update the metadata catalog";

/// Any failure a handler can return; rendered as `{detail, code}`.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::Validation(_) | GatewayError::QueryFailed(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::ConnectionFailure(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::CatalogWrite(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError(e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError(GatewayError::Validation(e.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        ApiError(GatewayError::Validation(e.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            GatewayError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                INTERNAL_DETAIL.to_string()
            }
            GatewayError::CatalogWrite(msg) => {
                tracing::error!(error = %msg, "Catalog write failed");
                CATALOG_WRITE_DETAIL.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            detail,
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}
