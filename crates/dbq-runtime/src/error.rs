//! Gateway-level error taxonomy.

use crate::adapter::UpstreamError;
use dbq_catalog::CatalogError;
use dbq_guard::GuardError;
use std::time::Duration;
use thiserror::Error;

/// Every failure a gateway operation can surface to its caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The SQL or connection URL was rejected. Client-caused.
    #[error("{0}")]
    Validation(String),

    /// The referenced connection does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The upstream could not be reached or authenticated against.
    #[error("failed to connect to upstream database: {0}")]
    ConnectionFailure(String),

    /// The upstream did not answer within the configured deadline.
    #[error("upstream query timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The upstream rejected a statement that passed the guard.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The catalog could not persist a change. Prior state is intact.
    #[error("{0}")]
    CatalogWrite(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation_error",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::ConnectionFailure(_) => "connection_failure",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::QueryFailed(_) => "query_failed",
            GatewayError::CatalogWrite(_) => "catalog_write_failure",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

impl From<GuardError> for GatewayError {
    fn from(e: GuardError) -> Self {
        GatewayError::Validation(e.to_string())
    }
}

impl From<CatalogError> for GatewayError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(_) => GatewayError::NotFound(e.to_string()),
            CatalogError::WriteFailed(_) => GatewayError::CatalogWrite(e.to_string()),
            other => GatewayError::Internal(other.into()),
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::UnsupportedUrl(_) => GatewayError::Validation(e.to_string()),
            UpstreamError::ConnectionFailed(msg) => GatewayError::ConnectionFailure(msg),
            UpstreamError::Timeout(after) => GatewayError::Timeout(after),
            UpstreamError::QueryFailed(msg) => GatewayError::QueryFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_errors_are_validation() {
        let err: GatewayError = GuardError::NotReadOnly {
            reason: "DROP".into(),
        }
        .into();
        assert_eq!(err.code(), "validation_error");
        assert_eq!(err.to_string(), "Only SELECT statements are allowed");
    }

    #[test]
    fn test_catalog_not_found_message() {
        let err: GatewayError = CatalogError::NotFound(3).into();
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), "Connection not found");
    }

    #[test]
    fn test_upstream_mapping() {
        let err: GatewayError = UpstreamError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(err.code(), "timeout");
        assert_eq!(err.to_string(), "upstream query timed out after 30s");

        let err: GatewayError = UpstreamError::ConnectionFailed("refused".into()).into();
        assert_eq!(err.code(), "connection_failure");

        let err: GatewayError = UpstreamError::UnsupportedUrl("mysql".into()).into();
        assert_eq!(err.code(), "validation_error");
    }
}
