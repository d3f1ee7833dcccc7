use crate::adapter::UpstreamAdapter;
use crate::error::GatewayError;
use dbq_catalog::Catalog;
use dbq_core::{ConnectionMetadata, redact_url};
use std::sync::Arc;

/// Snapshots an upstream schema into the catalog.
pub struct MetadataSync {
    catalog: Arc<Catalog>,
    upstream: Arc<dyn UpstreamAdapter>,
}

impl MetadataSync {
    pub fn new(catalog: Arc<Catalog>, upstream: Arc<dyn UpstreamAdapter>) -> Self {
        Self { catalog, upstream }
    }

    /// Introspect `connection_url`, then register it and replace its tables.
    ///
    /// Introspection runs before any catalog write, so an unreachable
    /// database leaves the catalog exactly as it was.
    pub async fn sync(
        &self,
        connection_url: &str,
        name: Option<&str>,
    ) -> Result<ConnectionMetadata, GatewayError> {
        let upstream = redact_url(connection_url);

        let tables = self.upstream.introspect(connection_url).await.map_err(|e| {
            tracing::warn!(upstream = %upstream, error = %e, "Introspection failed");
            GatewayError::from(e)
        })?;

        let connection = self.catalog.upsert_connection(connection_url, name).await?;
        self.catalog
            .replace_table_metadata(connection.id, &tables)
            .await?;
        let connection = self.catalog.touch_last_synced(connection.id).await?;

        tracing::info!(
            connection_id = connection.id,
            upstream = %upstream,
            tables = tables.len(),
            "Schema synced"
        );

        Ok(ConnectionMetadata { connection, tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeUpstream, users_schema};
    use crate::UpstreamError;
    use dbq_core::{ColumnInfo, TableInfo};

    const URL: &str = "postgres://app:pw@localhost/app";

    #[tokio::test]
    async fn test_sync_then_get_metadata() {
        let catalog = Arc::new(Catalog::in_memory().await.unwrap());
        let sync = MetadataSync::new(
            catalog.clone(),
            Arc::new(FakeUpstream::with_schema(users_schema())),
        );

        let synced = sync.sync(URL, Some("app")).await.unwrap();
        assert!(synced.connection.last_synced.is_some());
        assert_eq!(synced.connection.name.as_deref(), Some("app"));

        let meta = catalog.get_metadata(synced.connection.id).await.unwrap();
        assert_eq!(meta.tables.len(), 1);
        let users = &meta.tables[0];
        assert_eq!((users.schema.as_str(), users.name.as_str()), ("public", "users"));
        assert!(!users.is_view);
        assert_eq!(
            users.columns,
            vec![ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "text")]
        );
    }

    #[tokio::test]
    async fn test_resync_replaces_snapshot_and_keeps_id() {
        let catalog = Arc::new(Catalog::in_memory().await.unwrap());
        let first = MetadataSync::new(
            catalog.clone(),
            Arc::new(FakeUpstream::with_schema(users_schema())),
        )
        .sync(URL, None)
        .await
        .unwrap();

        let orders = vec![TableInfo {
            schema: "sales".to_string(),
            name: "orders".to_string(),
            is_view: false,
            columns: vec![ColumnInfo::new("id", "bigint")],
        }];
        let second = MetadataSync::new(
            catalog.clone(),
            Arc::new(FakeUpstream::with_schema(orders.clone())),
        )
        .sync(URL, None)
        .await
        .unwrap();

        assert_eq!(first.connection.id, second.connection.id);
        assert_eq!(catalog.get_metadata(second.connection.id).await.unwrap().tables, orders);
    }

    #[tokio::test]
    async fn test_failed_introspection_leaves_catalog_untouched() {
        let catalog = Arc::new(Catalog::in_memory().await.unwrap());

        let failing = MetadataSync::new(
            catalog.clone(),
            Arc::new(FakeUpstream::failing(|| {
                UpstreamError::ConnectionFailed("connection refused".into())
            })),
        );
        let err = failing.sync(URL, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::ConnectionFailure(_)));
        assert!(catalog.list_connections().await.unwrap().is_empty());

        let synced = MetadataSync::new(
            catalog.clone(),
            Arc::new(FakeUpstream::with_schema(users_schema())),
        )
        .sync(URL, None)
        .await
        .unwrap();

        assert!(failing.sync(URL, None).await.is_err());
        let meta = catalog.get_metadata(synced.connection.id).await.unwrap();
        assert_eq!(meta.tables, users_schema());
        assert_eq!(meta.connection.last_synced, synced.connection.last_synced);
    }
}
