use crate::error::GatewayError;
use dbq_catalog::Catalog;
use dbq_core::Connection;
use std::sync::Arc;

/// Maps a logical connection id to its registered physical address.
#[derive(Clone)]
pub struct ConnectionResolver {
    catalog: Arc<Catalog>,
}

impl ConnectionResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Fails with `NotFound("Connection not found")` for unknown ids.
    pub async fn resolve(&self, connection_id: i64) -> Result<Connection, GatewayError> {
        Ok(self.catalog.get_connection(connection_id).await?)
    }
}
