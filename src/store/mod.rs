//! # Spatial Store
//!
//! Connection seam between the request pipelines and the database.
//!
//! A [`ConnectionProvider`] opens one [`SpatialSession`] per request. The
//! caller owns the session and must call [`SpatialSession::close`] on every
//! exit path; sessions are never shared or reused across requests.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiResult;
use crate::query::{DistinctQuery, FeatureQuery};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryCatalog, MemoryProvider, MemoryTable};
pub use postgres::{PgProvider, PgSession};

/// (name, data type) of a non-geometry column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Opens per-request sessions.
pub trait ConnectionProvider: Send + Sync + 'static {
    type Session: SpatialSession;

    /// Fails with `ServiceUnavailable` when no connection can be made.
    fn connect(&self) -> impl Future<Output = ApiResult<Self::Session>> + Send;
}

/// One open database connection.
pub trait SpatialSession: Send + Sized {
    /// Schema the catalog lookups are scoped to
    fn schema(&self) -> &str;

    /// Name of the geometry column excluded from properties
    fn geometry_column(&self) -> &str;

    /// Tables registered in the spatial-metadata catalog.
    fn list_layers(&mut self) -> impl Future<Output = ApiResult<Vec<String>>> + Send;

    fn table_exists(&mut self, table: &str) -> impl Future<Output = ApiResult<bool>> + Send;

    fn column_exists(
        &mut self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = ApiResult<bool>> + Send;

    /// Non-geometry columns in catalog order; empty for unknown tables.
    fn describe_columns(
        &mut self,
        table: &str,
    ) -> impl Future<Output = ApiResult<Vec<ColumnDescriptor>>> + Send;

    fn distinct_values(
        &mut self,
        query: &DistinctQuery,
    ) -> impl Future<Output = ApiResult<Vec<String>>> + Send;

    /// `None` when the query matched no rows.
    fn feature_collection(
        &mut self,
        query: &FeatureQuery,
    ) -> impl Future<Output = ApiResult<Option<Value>>> + Send;

    /// Releases the connection.
    fn close(self) -> impl Future<Output = ()> + Send;
}
