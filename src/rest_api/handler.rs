//! # Request Pipelines
//!
//! One function per endpoint: validate → build query → execute → shape.
//! Each runs against a session the caller opened and closes afterwards.

use serde_json::Value;

use crate::catalog::{geometry_column, list_columns, require_table, resolve_column, resolve_table, validate_identifier};
use crate::config::LayerRegistry;
use crate::errors::{ApiError, ApiResult};
use crate::query::{DateRange, DistinctQuery, FeatureCollection, FeatureFilter, FeatureQuery, Page};
use crate::store::{ColumnDescriptor, SpatialSession};

use super::parser::{DistrictParams, FilterParams};

/// All tables in the spatial-metadata catalog.
pub async fn list_layers<S: SpatialSession>(session: &mut S) -> ApiResult<Vec<String>> {
    let layers = session.list_layers().await?;
    tracing::info!(count = layers.len(), "fetched layers");
    Ok(layers)
}

/// Distinct non-null `state` values across the configured state sources.
///
/// Configured tables missing from the catalog are skipped.
pub async fn list_states<S: SpatialSession>(
    session: &mut S,
    registry: &LayerRegistry,
) -> ApiResult<Vec<String>> {
    let mut sources = Vec::new();
    for name in registry.state_sources() {
        match resolve_table(session, name).await? {
            Some(table) => sources.push(table),
            None => tracing::warn!(table = %name, "configured state layer not in geometry_columns"),
        }
    }

    let states = session.distinct_values(&DistinctQuery::states(sources)).await?;
    tracing::info!(count = states.len(), "fetched states");
    Ok(states)
}

/// Distinct non-null `district` values across the requested layers.
///
/// Layers that are not in the catalog are skipped; if none remain the
/// result is empty.
pub async fn list_districts<S: SpatialSession>(
    session: &mut S,
    params: &DistrictParams,
) -> ApiResult<Vec<String>> {
    let mut sources = Vec::new();
    for name in &params.layers {
        if let Some(table) = resolve_table(session, name).await? {
            sources.push(table);
        }
    }
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let districts = session
        .distinct_values(&DistinctQuery::districts(sources, params.state.clone()))
        .await?;
    tracing::info!(
        layers = ?params.layers,
        state = ?params.state,
        count = districts.len(),
        "fetched districts"
    );
    Ok(districts)
}

/// A page of `table` as a FeatureCollection.
pub async fn get_features<S: SpatialSession>(
    session: &mut S,
    table: &str,
    page: Page,
) -> ApiResult<Value> {
    let query = feature_query(session, table, page).await?;
    let collection = session.feature_collection(&query).await?;
    Ok(collection.unwrap_or_else(|| FeatureCollection::empty().to_value()))
}

/// A page of `table` restricted to a date range and optional state/district.
pub async fn filter_features<S: SpatialSession>(
    session: &mut S,
    table: &str,
    registry: &LayerRegistry,
    params: &FilterParams,
) -> ApiResult<Value> {
    let query = feature_query(session, table, params.page).await?;

    let date_column = registry.date_column(query.table.name()).ok_or_else(|| {
        ApiError::InvalidArgument(format!("No date column defined for table '{}'", table))
    })?;
    let date_column = resolve_column(session, &query.table, date_column)
        .await?
        .ok_or_else(|| {
            ApiError::InvalidArgument(format!("Table '{}' has no {} column", table, date_column))
        })?;

    let query = query.with_filter(FeatureFilter {
        date_range: DateRange {
            column: date_column,
            start: params.start_date.clone(),
            end: params.end_date.clone(),
        },
        state: params.state.clone(),
        district: params.district.clone(),
    });
    let collection = session.feature_collection(&query).await?;
    Ok(collection.unwrap_or_else(|| FeatureCollection::empty().to_value()))
}

/// `{name, type}` of every non-geometry column.
///
/// An unknown table and a geometry-only table are both `NotFound`.
pub async fn get_columns<S: SpatialSession>(
    session: &mut S,
    table: &str,
) -> ApiResult<Vec<ColumnDescriptor>> {
    let table = validate_identifier(table)?;
    let columns = session.describe_columns(table).await?;
    if columns.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Table '{}' not found or has no attributes",
            table
        )));
    }
    Ok(columns)
}

async fn feature_query<S: SpatialSession>(
    session: &mut S,
    table: &str,
    page: Page,
) -> ApiResult<FeatureQuery> {
    let table = require_table(session, table).await?;
    let geometry = geometry_column(session, &table).await?;
    let columns = list_columns(session, &table).await?;
    Ok(FeatureQuery::new(table, geometry, columns, page))
}
