//! Shared application state.

use dbq_catalog::Catalog;
use dbq_core::GatewayConfig;
use dbq_runtime::{ConnectionResolver, MetadataSync, QueryExecutor, UpstreamAdapter};
use std::sync::Arc;

/// Cheap to clone; every handler gets its own copy.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub catalog: Arc<Catalog>,
    pub executor: Arc<QueryExecutor>,
    pub sync: Arc<MetadataSync>,
}

impl AppState {
    /// Wire the runtime components around one catalog and one adapter.
    pub fn new(
        config: Arc<GatewayConfig>,
        catalog: Arc<Catalog>,
        upstream: Arc<dyn UpstreamAdapter>,
    ) -> Self {
        let resolver = ConnectionResolver::new(catalog.clone());
        Self {
            executor: Arc::new(QueryExecutor::new(resolver, upstream.clone())),
            sync: Arc::new(MetadataSync::new(catalog.clone(), upstream)),
            config,
            catalog,
        }
    }
}
