//! In-process upstream used by the runtime tests.

use crate::adapter::{ResultSet, UpstreamAdapter, UpstreamError};
use async_trait::async_trait;
use dbq_core::{ColumnInfo, QueryColumn, TableInfo};
use serde_json::json;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeUpstream {
    schema: Vec<TableInfo>,
    result: ResultSet,
    failure: Option<fn() -> UpstreamError>,
    executed: Mutex<Vec<(String, String)>>,
}

impl FakeUpstream {
    pub(crate) fn with_schema(schema: Vec<TableInfo>) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    pub(crate) fn with_result(result: ResultSet) -> Self {
        Self {
            result,
            ..Default::default()
        }
    }

    pub(crate) fn failing(failure: fn() -> UpstreamError) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// `(connection_url, sql)` of every executed statement.
    pub(crate) fn executed(&self) -> Vec<(String, String)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamAdapter for FakeUpstream {
    async fn introspect(&self, _connection_url: &str) -> Result<Vec<TableInfo>, UpstreamError> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.schema.clone()),
        }
    }

    async fn execute(&self, connection_url: &str, sql: &str) -> Result<ResultSet, UpstreamError> {
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        self.executed
            .lock()
            .unwrap()
            .push((connection_url.to_string(), sql.to_string()));
        Ok(self.result.clone())
    }
}

pub(crate) fn users_schema() -> Vec<TableInfo> {
    vec![TableInfo {
        schema: "public".to_string(),
        name: "users".to_string(),
        is_view: false,
        columns: vec![ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "text")],
    }]
}

pub(crate) fn users_result() -> ResultSet {
    ResultSet {
        columns: vec![QueryColumn::named("id")],
        rows: vec![vec![json!(1)], vec![json!(2)]],
    }
}
