//! SQLite-backed catalog store.

use crate::error::{CatalogError, write_failed};
use chrono::{DateTime, Utc};
use dbq_core::{ColumnInfo, Connection, ConnectionMetadata, TableInfo};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CONNECTION_COLUMNS: &str = "id, name, connection_url, created_at, last_synced";

#[derive(Debug, FromRow)]
struct ConnectionRow {
    id: i64,
    name: Option<String>,
    connection_url: String,
    created_at: DateTime<Utc>,
    last_synced: Option<DateTime<Utc>>,
}

impl From<ConnectionRow> for Connection {
    fn from(row: ConnectionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            connection_url: row.connection_url,
            created_at: row.created_at,
            last_synced: row.last_synced,
        }
    }
}

#[derive(Debug, FromRow)]
struct TableRow {
    schema_name: String,
    table_name: String,
    is_view: bool,
    columns_json: Json<Vec<ColumnInfo>>,
}

impl From<TableRow> for TableInfo {
    fn from(row: TableRow) -> Self {
        Self {
            schema: row.schema_name,
            name: row.table_name,
            is_view: row.is_view,
            columns: row.columns_json.0,
        }
    }
}

/// Registry of connections and their table metadata.
pub struct Catalog {
    pool: SqlitePool,
    /// One async mutex per connection id; serializes metadata replacement.
    sync_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl Catalog {
    /// Open (creating if needed) the catalog file at `path` and apply migrations.
    pub async fn open(path: &str) -> Result<Self, CatalogError> {
        ensure_parent_dir(path)?;
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path, "Opened metadata catalog");
        Self::from_pool(pool).await
    }

    /// A private in-memory catalog, used by tests and ephemeral runs.
    pub async fn in_memory() -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        // The database lives only as long as its single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CatalogError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            sync_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Register `url`, or return the record already registered for it.
    ///
    /// `name` is only used when the connection is created.
    pub async fn upsert_connection(
        &self,
        url: &str,
        name: Option<&str>,
    ) -> Result<Connection, CatalogError> {
        let inserted = sqlx::query(
            "INSERT INTO connections (name, connection_url, created_at) VALUES (?, ?, ?) \
             ON CONFLICT (connection_url) DO NOTHING",
        )
        .bind(name)
        .bind(url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(write_failed)?
        .rows_affected();

        let row: ConnectionRow = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections WHERE connection_url = ?"
        ))
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(write_failed)?;

        if inserted > 0 {
            tracing::info!(connection_id = row.id, "Registered connection");
        }
        Ok(row.into())
    }

    /// Atomically replace every table row of `connection_id` with `tables`.
    pub async fn replace_table_metadata(
        &self,
        connection_id: i64,
        tables: &[TableInfo],
    ) -> Result<(), CatalogError> {
        let lock = self.sync_lock(connection_id);
        let _held = lock.lock().await;

        let mut tx = self.pool.begin().await.map_err(write_failed)?;

        // Write first so the transaction takes the write lock up front.
        sqlx::query("DELETE FROM table_metadata WHERE connection_id = ?")
            .bind(connection_id)
            .execute(&mut *tx)
            .await
            .map_err(write_failed)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM connections WHERE id = ?")
            .bind(connection_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(write_failed)?;
        if exists.is_none() {
            // Dropping `tx` rolls back.
            return Err(CatalogError::NotFound(connection_id));
        }

        for table in tables {
            sqlx::query(
                "INSERT INTO table_metadata \
                 (connection_id, schema_name, table_name, is_view, columns_json) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(connection_id)
            .bind(&table.schema)
            .bind(&table.name)
            .bind(table.is_view)
            .bind(Json(&table.columns))
            .execute(&mut *tx)
            .await
            .map_err(write_failed)?;
        }

        tx.commit().await.map_err(write_failed)?;

        tracing::info!(
            connection_id,
            tables = tables.len(),
            "Replaced table metadata"
        );
        Ok(())
    }

    /// Stamp the connection as synced now.
    pub async fn touch_last_synced(&self, connection_id: i64) -> Result<Connection, CatalogError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "UPDATE connections SET last_synced = ? WHERE id = ? RETURNING {CONNECTION_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_failed)?;

        row.map(Connection::from)
            .ok_or(CatalogError::NotFound(connection_id))
    }

    /// Set or clear the display name.
    pub async fn rename_connection(
        &self,
        connection_id: i64,
        name: Option<&str>,
    ) -> Result<Connection, CatalogError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "UPDATE connections SET name = ? WHERE id = ? RETURNING {CONNECTION_COLUMNS}"
        ))
        .bind(name)
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_failed)?;

        row.map(Connection::from)
            .ok_or(CatalogError::NotFound(connection_id))
    }

    /// Remove a connection and, by cascade, its table metadata.
    pub async fn delete_connection(&self, connection_id: i64) -> Result<(), CatalogError> {
        let lock = self.sync_lock(connection_id);
        let _held = lock.lock().await;

        let deleted = sqlx::query("DELETE FROM connections WHERE id = ?")
            .bind(connection_id)
            .execute(&self.pool)
            .await
            .map_err(write_failed)?
            .rows_affected();

        if deleted == 0 {
            return Err(CatalogError::NotFound(connection_id));
        }

        self.locks().remove(&connection_id);
        tracing::info!(connection_id, "Deleted connection");
        Ok(())
    }

    /// All connections, most recently created first.
    pub async fn list_connections(&self) -> Result<Vec<Connection>, CatalogError> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Connection::from).collect())
    }

    /// Look up a connection without its tables.
    pub async fn get_connection(&self, connection_id: i64) -> Result<Connection, CatalogError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?"
        ))
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Connection::from)
            .ok_or(CatalogError::NotFound(connection_id))
    }

    /// A connection together with its current table snapshot.
    pub async fn get_metadata(
        &self,
        connection_id: i64,
    ) -> Result<ConnectionMetadata, CatalogError> {
        // One read transaction, so the connection row and tables come from
        // the same snapshot.
        let mut tx = self.pool.begin().await?;

        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?"
        ))
        .bind(connection_id)
        .fetch_optional(&mut *tx)
        .await?;
        let connection: Connection = row
            .ok_or(CatalogError::NotFound(connection_id))?
            .into();

        let tables: Vec<TableRow> = sqlx::query_as(
            "SELECT schema_name, table_name, is_view, columns_json \
             FROM table_metadata WHERE connection_id = ? \
             ORDER BY schema_name, table_name",
        )
        .bind(connection_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ConnectionMetadata {
            connection,
            tables: tables.into_iter().map(TableInfo::from).collect(),
        })
    }

    fn sync_lock(&self, connection_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.locks().entry(connection_id).or_default().clone()
    }

    fn locks(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Arc<tokio::sync::Mutex<()>>>> {
        self.sync_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_parent_dir(file_path: &str) -> std::io::Result<()> {
    let p = Path::new(file_path);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
