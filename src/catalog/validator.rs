//! Catalog-backed validation of table and column names.
//!
//! [`TableName`] and [`ColumnName`] are only constructed here, after the
//! spatial or schema catalog confirmed the name. Query builders accept
//! nothing else, so an unchecked identifier cannot reach SQL text.

use std::fmt;

use crate::errors::{ApiError, ApiResult};
use crate::store::SpatialSession;

use super::identifier::validate_identifier;

/// A table registered in the spatial-metadata catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: String,
    name: String,
}

impl TableName {
    fn from_catalog(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A column found in a [`TableName`]'s schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    fn from_catalog(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Looks `name` up in the spatial catalog.
///
/// Returns `Ok(None)` for a well-formed name that is not a registered
/// spatial table, and `InvalidArgument` for a malformed one.
pub async fn resolve_table<S: SpatialSession>(
    session: &mut S,
    name: &str,
) -> ApiResult<Option<TableName>> {
    let name = validate_identifier(name)?;
    if session.table_exists(name).await? {
        Ok(Some(TableName::from_catalog(session.schema(), name)))
    } else {
        Ok(None)
    }
}

/// Like [`resolve_table`], but a missing table is `NotFound`.
pub async fn require_table<S: SpatialSession>(session: &mut S, name: &str) -> ApiResult<TableName> {
    match resolve_table(session, name).await? {
        Some(table) => Ok(table),
        None => {
            tracing::error!(table = %name, "table not found in geometry_columns");
            Err(ApiError::table_not_found(name))
        }
    }
}

/// Confirms that `column` exists on `table`.
pub async fn resolve_column<S: SpatialSession>(
    session: &mut S,
    table: &TableName,
    column: &str,
) -> ApiResult<Option<ColumnName>> {
    if session.column_exists(table.name(), column).await? {
        Ok(Some(ColumnName::from_catalog(column)))
    } else {
        Ok(None)
    }
}

/// The configured geometry column of `table`.
pub async fn geometry_column<S: SpatialSession>(
    session: &mut S,
    table: &TableName,
) -> ApiResult<ColumnName> {
    let geometry = session.geometry_column().to_string();
    resolve_column(session, table, &geometry)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(format!(
                "Table '{}' has no {} column",
                table, geometry
            ))
        })
}

/// Non-geometry columns of `table`, in catalog order.
pub async fn list_columns<S: SpatialSession>(
    session: &mut S,
    table: &TableName,
) -> ApiResult<Vec<ColumnName>> {
    let columns = session.describe_columns(table.name()).await?;
    Ok(columns
        .iter()
        .map(|column| ColumnName::from_catalog(&column.name))
        .collect())
}
