//! PostgreSQL implementation of [`UpstreamAdapter`].
//!
//! Every call opens its own connection, configured read-only with a server
//! side `statement_timeout`, and closes it before returning.

mod introspect;
mod values;

pub use introspect::{INTROSPECT_SQL, IntrospectRow, group_rows};
pub use values::{decode_value, text_to_json};

use async_trait::async_trait;
use dbq_core::{QueryColumn, TableInfo, UpstreamLimits, redact_url};
use dbq_runtime::{ResultSet, UpstreamAdapter, UpstreamError};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement, TypeInfo};
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Slack on the client deadline so the server-side cancel normally wins.
const CLIENT_DEADLINE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    limits: UpstreamLimits,
}

impl PostgresAdapter {
    pub fn new(limits: UpstreamLimits) -> Self {
        Self { limits }
    }

    fn connect_options(&self, connection_url: &str) -> Result<PgConnectOptions, UpstreamError> {
        let parsed = url::Url::parse(connection_url)
            .map_err(|_| UpstreamError::UnsupportedUrl(redact_url(connection_url)))?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(UpstreamError::UnsupportedUrl(format!(
                "scheme '{}' is not supported",
                parsed.scheme()
            )));
        }

        let statement_timeout_ms = self.limits.statement_timeout().as_millis();
        let options = PgConnectOptions::from_str(connection_url)
            .map_err(|e| UpstreamError::UnsupportedUrl(e.to_string()))?
            .application_name("dbq")
            .options([
                ("default_transaction_read_only", "on".to_string()),
                ("statement_timeout", statement_timeout_ms.to_string()),
                // Pin the text forms that values are normalized from.
                ("DateStyle", "ISO".to_string()),
                ("TimeZone", "UTC".to_string()),
                ("IntervalStyle", "postgres".to_string()),
                ("extra_float_digits", "3".to_string()),
            ])
            .disable_statement_logging();
        Ok(options)
    }

    async fn connect(&self, connection_url: &str) -> Result<PgConnection, UpstreamError> {
        let options = self.connect_options(connection_url)?;
        let deadline = self.limits.connect_timeout();

        match tokio::time::timeout(deadline, PgConnection::connect_with(&options)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => {
                tracing::warn!(
                    upstream = %redact_url(connection_url),
                    error = %e,
                    "Upstream connection failed"
                );
                Err(UpstreamError::ConnectionFailed(e.to_string()))
            }
            Err(_) => Err(UpstreamError::Timeout(deadline)),
        }
    }

    /// Run `work` on a fresh connection under the statement deadline, then
    /// close the connection whatever the outcome.
    async fn with_connection<T, F, Fut>(
        &self,
        connection_url: &str,
        work: F,
    ) -> Result<T, UpstreamError>
    where
        F: FnOnce(PgConnection) -> Fut,
        Fut: Future<Output = (PgConnection, Result<T, sqlx::Error>)>,
    {
        let conn = self.connect(connection_url).await?;
        let deadline = self.limits.statement_timeout();

        match tokio::time::timeout(deadline + CLIENT_DEADLINE_GRACE, work(conn)).await {
            Ok((conn, result)) => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(error = %e, "Error closing upstream connection");
                }
                result.map_err(|e| map_query_error(e, deadline))
            }
            // The connection was dropped with the cancelled future.
            Err(_) => Err(UpstreamError::Timeout(deadline)),
        }
    }
}

#[async_trait]
impl UpstreamAdapter for PostgresAdapter {
    async fn introspect(&self, connection_url: &str) -> Result<Vec<TableInfo>, UpstreamError> {
        let rows = self
            .with_connection(connection_url, |mut conn| async move {
                let rows = sqlx::query_as::<_, IntrospectRow>(INTROSPECT_SQL)
                    .fetch_all(&mut conn)
                    .await;
                (conn, rows)
            })
            .await?;

        let tables = group_rows(rows);
        tracing::debug!(
            upstream = %redact_url(connection_url),
            tables = tables.len(),
            "Introspected upstream schema"
        );
        Ok(tables)
    }

    async fn execute(&self, connection_url: &str, sql: &str) -> Result<ResultSet, UpstreamError> {
        let start = Instant::now();
        let sql = sql.to_string();

        let result_set = self
            .with_connection(connection_url, |mut conn| async move {
                let result = fetch_result_set(&mut conn, &sql).await;
                (conn, result)
            })
            .await?;

        tracing::debug!(
            rows = result_set.rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upstream query finished"
        );
        Ok(result_set)
    }
}

async fn fetch_result_set(conn: &mut PgConnection, sql: &str) -> Result<ResultSet, sqlx::Error> {
    // Columns come from the prepared statement so that empty results
    // still carry their header.
    let columns: Vec<QueryColumn> = {
        let statement = (&mut *conn).prepare(sql).await?;
        statement
            .columns()
            .iter()
            .map(|c| QueryColumn {
                name: c.name().to_string(),
                data_type: Some(c.type_info().name().to_string()),
            })
            .collect()
    };

    // The simple query protocol returns every value in its text form.
    let rows = conn.fetch_all(sqlx::raw_sql(sql)).await?;
    let rows = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|i| decode_value(row, i))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(ResultSet { columns, rows })
}

fn map_query_error(e: sqlx::Error, deadline: Duration) -> UpstreamError {
    match e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
            UpstreamError::Timeout(deadline)
        }
        sqlx::Error::Database(db) => UpstreamError::QueryFailed(db.message().to_string()),
        e @ (sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)) => {
            UpstreamError::ConnectionFailed(e.to_string())
        }
        other => UpstreamError::QueryFailed(other.to_string()),
    }
}
