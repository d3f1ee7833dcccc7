//! # dbq-runtime
//!
//! Orchestration between the catalog, the SQL guard and an upstream adapter.
//!
//! ```text
//! run_query(connection_id, sql)
//!       │
//!       ▼
//! ┌──────────────────────┐
//! │ 1. Resolve id → url  │  ← dbq-catalog
//! │ 2. Guard SQL         │  ← dbq-guard
//! │ 3. Execute upstream  │  ← UpstreamAdapter (fresh connection per call)
//! │ 4. Normalize result  │
//! └──────────────────────┘
//!
//! sync(url, name)
//!   introspect → upsert connection → replace tables → stamp last_synced
//! ```
//!
//! Nothing here holds state between calls beyond shared handles to the
//! catalog and adapter.

pub mod adapter;
pub mod error;
pub mod executor;
pub mod resolver;
pub mod sync;

#[cfg(test)]
mod testing;

pub use adapter::{ResultSet, UpstreamAdapter, UpstreamError};
pub use error::GatewayError;
pub use executor::QueryExecutor;
pub use resolver::ConnectionResolver;
pub use sync::MetadataSync;
