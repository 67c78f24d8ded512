//! PostgreSQL/PostGIS sessions over `sqlx`.
//!
//! One `PgConnection` per request; no pool.

use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, Postgres};
use sqlx::query::QueryScalar;
use sqlx::Connection;

use crate::config::DatabaseConfig;
use crate::errors::{ApiError, ApiResult};
use crate::query::catalog::{COLUMN_EXISTS, DESCRIBE_COLUMNS, LIST_LAYERS, TABLE_EXISTS};
use crate::query::{BindValue, DistinctQuery, FeatureQuery};

use super::{ColumnDescriptor, ConnectionProvider, SpatialSession};

/// Opens a fresh connection for every request.
pub struct PgProvider {
    options: PgConnectOptions,
    schema: String,
    geometry_column: String,
}

impl PgProvider {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.dbname);

        Self {
            options,
            schema: config.schema.clone(),
            geometry_column: config.geometry_column.clone(),
        }
    }
}

impl ConnectionProvider for PgProvider {
    type Session = PgSession;

    async fn connect(&self) -> ApiResult<PgSession> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

        Ok(PgSession {
            conn,
            schema: self.schema.clone(),
            geometry_column: self.geometry_column.clone(),
        })
    }
}

/// An open connection plus the catalog scope it queries.
pub struct PgSession {
    conn: PgConnection,
    schema: String,
    geometry_column: String,
}

/// Binds `params` to their `$n` placeholders, in order.
fn bind_params<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &'q [BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            BindValue::Text(value) => query.bind(value.as_str()),
            BindValue::Int(value) => query.bind(*value),
        };
    }
    query
}

impl SpatialSession for PgSession {
    fn schema(&self) -> &str {
        &self.schema
    }

    fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    async fn list_layers(&mut self) -> ApiResult<Vec<String>> {
        let layers = sqlx::query_scalar::<_, String>(LIST_LAYERS)
            .bind(&self.schema)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(layers)
    }

    async fn table_exists(&mut self, table: &str) -> ApiResult<bool> {
        let found = sqlx::query_scalar::<_, i32>(TABLE_EXISTS)
            .bind(&self.schema)
            .bind(table)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> ApiResult<bool> {
        let found = sqlx::query_scalar::<_, i32>(COLUMN_EXISTS)
            .bind(&self.schema)
            .bind(table)
            .bind(column)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(found.is_some())
    }

    async fn describe_columns(&mut self, table: &str) -> ApiResult<Vec<ColumnDescriptor>> {
        let rows = sqlx::query_as::<_, (String, String)>(DESCRIBE_COLUMNS)
            .bind(&self.schema)
            .bind(table)
            .bind(&self.geometry_column)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnDescriptor { name, data_type })
            .collect())
    }

    async fn distinct_values(&mut self, query: &DistinctQuery) -> ApiResult<Vec<String>> {
        let Some(sql) = query.to_sql() else {
            return Ok(Vec::new());
        };
        let values = bind_params(sqlx::query_scalar::<_, String>(&sql.sql), &sql.params)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(values)
    }

    async fn feature_collection(&mut self, query: &FeatureQuery) -> ApiResult<Option<Value>> {
        let sql = query.to_sql();
        let collection = bind_params(sqlx::query_scalar::<_, Value>(&sql.sql), &sql.params)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(collection)
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::warn!(error = %e, "failed to close database connection");
        }
    }
}
