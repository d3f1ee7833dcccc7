use crate::adapter::UpstreamAdapter;
use crate::error::GatewayError;
use crate::resolver::ConnectionResolver;
use dbq_core::{LIMIT_APPLIED_MESSAGE, QueryResult, redact_url};
use dbq_guard::SqlGuard;
use std::sync::Arc;
use std::time::Instant;

/// Runs client SQL against a registered connection.
///
/// Each call resolves the connection, guards the SQL and opens its own
/// upstream connection; no state survives between calls.
pub struct QueryExecutor {
    resolver: ConnectionResolver,
    guard: SqlGuard,
    upstream: Arc<dyn UpstreamAdapter>,
}

impl QueryExecutor {
    pub fn new(resolver: ConnectionResolver, upstream: Arc<dyn UpstreamAdapter>) -> Self {
        Self {
            resolver,
            guard: SqlGuard::new(),
            upstream,
        }
    }

    pub async fn run_query(
        &self,
        connection_id: i64,
        sql: &str,
    ) -> Result<QueryResult, GatewayError> {
        // Resolution comes first: an unknown id fails before any parsing.
        let connection = self.resolver.resolve(connection_id).await?;
        let guarded = self.guard.guard(sql)?;

        let start = Instant::now();
        let result_set = self
            .upstream
            .execute(&connection.connection_url, &guarded.patched_sql)
            .await
            .map_err(|e| {
                tracing::warn!(
                    connection_id,
                    upstream = %redact_url(&connection.connection_url),
                    error = %e,
                    "Upstream query failed"
                );
                GatewayError::from(e)
            })?;

        tracing::info!(
            connection_id,
            rows = result_set.rows.len(),
            limit_added = guarded.limit_added,
            duration_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(QueryResult {
            columns: result_set.columns,
            rows: result_set.rows,
            limit_added: guarded.limit_added,
            message: guarded
                .limit_added
                .then(|| LIMIT_APPLIED_MESSAGE.to_string()),
        })
    }
}
