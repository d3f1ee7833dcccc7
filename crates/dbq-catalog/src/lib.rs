//! # dbq-catalog
//!
//! Durable registry of upstream connections and their last-known schema
//! snapshot, stored in SQLite.
//!
//! - Connections are unique by URL; registering a URL twice returns the
//!   existing record.
//! - A connection's table metadata is replaced in a single transaction, and
//!   replacements for the same connection are serialized, so readers never
//!   see a mix of two snapshots.
//! - Deleting a connection cascades to its table metadata.
//!
//! Operations return plain snapshots (`dbq_core::Connection`,
//! `dbq_core::TableInfo`); nothing handed out is tied to the database.

pub mod error;
pub mod store;

pub use error::CatalogError;
pub use store::Catalog;
