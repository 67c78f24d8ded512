//! Spatial Layer HTTP Routes
//!
//! Endpoints for layer discovery, filter values and GeoJSON features.
//!
//! Every handler opens one session, runs its pipeline, and closes the
//! session before inspecting the result, so the connection is released on
//! success and failure alike.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::catalog::validate_identifier;
use crate::config::LayerRegistry;
use crate::errors::ApiResult;
use crate::rest_api::handler;
use crate::rest_api::{
    parse_page, ColumnsResponse, DistrictParams, DistrictsResponse, FilterParams,
    LayersResponse, StatesResponse,
};
use crate::store::{ConnectionProvider, SpatialSession};

// ==================
// Shared State
// ==================

/// Read-only state shared across handlers
pub struct SpatialState<P: ConnectionProvider> {
    pub provider: P,
    pub layers: LayerRegistry,
}

impl<P: ConnectionProvider> SpatialState<P> {
    pub fn new(provider: P, layers: LayerRegistry) -> Self {
        Self { provider, layers }
    }
}

type SharedState<P> = Arc<SpatialState<P>>;

// ==================
// Spatial Routes
// ==================

/// Create spatial routes
pub fn spatial_routes<P: ConnectionProvider>(state: SharedState<P>) -> Router {
    Router::new()
        .route("/layers", get(layers_handler::<P>))
        .route("/states", get(states_handler::<P>))
        .route("/districts", get(districts_handler::<P>))
        .route("/geojson/:table_name", get(geojson_handler::<P>))
        .route("/filter/:table_name", get(filter_handler::<P>))
        .route("/columns/:table_name", get(columns_handler::<P>))
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

async fn open_session<P: ConnectionProvider>(
    state: &SpatialState<P>,
    operation: &'static str,
    subject: &str,
) -> ApiResult<P::Session> {
    state.provider.connect().await.map_err(|e| {
        tracing::error!(operation, subject, error = %e, "database connection failed");
        e
    })
}

/// Logs a failed result with its context before it becomes a response.
fn finish<T>(operation: &'static str, subject: &str, result: ApiResult<T>) -> ApiResult<T> {
    if let Err(e) = &result {
        tracing::error!(
            operation,
            subject,
            status = e.status_code().as_u16(),
            error = %e,
            "request failed"
        );
    }
    result
}

// ==================
// Handlers
// ==================

async fn layers_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
) -> ApiResult<Json<LayersResponse>> {
    const OPERATION: &str = "list_layers";

    let mut session = open_session(&state, OPERATION, "").await?;
    let result = handler::list_layers(&mut session).await;
    session.close().await;

    let layers = finish(OPERATION, "", result)?;
    Ok(Json(LayersResponse { layers }))
}

async fn states_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
) -> ApiResult<Json<StatesResponse>> {
    const OPERATION: &str = "list_states";

    let mut session = open_session(&state, OPERATION, "").await?;
    let result = handler::list_states(&mut session, &state.layers).await;
    session.close().await;

    let states = finish(OPERATION, "", result)?;
    Ok(Json(StatesResponse { states }))
}

async fn districts_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<DistrictsResponse>> {
    const OPERATION: &str = "list_districts";
    let subject = query.get("layers").cloned().unwrap_or_default();

    let params = finish(OPERATION, &subject, DistrictParams::parse(&query))?;
    let mut session = open_session(&state, OPERATION, &subject).await?;
    let result = handler::list_districts(&mut session, &params).await;
    session.close().await;

    let districts = finish(OPERATION, &subject, result)?;
    Ok(Json(DistrictsResponse { districts }))
}

async fn geojson_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
    Path(table_name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    const OPERATION: &str = "get_geojson";
    tracing::info!(table = %table_name, "fetching GeoJSON");

    finish(OPERATION, &table_name, validate_identifier(&table_name).map(|_| ()))?;
    let page = finish(OPERATION, &table_name, parse_page(&query))?;

    let mut session = open_session(&state, OPERATION, &table_name).await?;
    let result = handler::get_features(&mut session, &table_name, page).await;
    session.close().await;

    finish(OPERATION, &table_name, result).map(Json)
}

async fn filter_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
    Path(table_name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    const OPERATION: &str = "filter_geojson";

    finish(OPERATION, &table_name, validate_identifier(&table_name).map(|_| ()))?;
    let params = finish(OPERATION, &table_name, FilterParams::parse(&query))?;
    tracing::info!(
        table = %table_name,
        start_date = %params.start_date,
        end_date = %params.end_date,
        state = ?params.state,
        district = ?params.district,
        "filtering GeoJSON"
    );

    let mut session = open_session(&state, OPERATION, &table_name).await?;
    let result = handler::filter_features(&mut session, &table_name, &state.layers, &params).await;
    session.close().await;

    finish(OPERATION, &table_name, result).map(Json)
}

async fn columns_handler<P: ConnectionProvider>(
    State(state): State<SharedState<P>>,
    Path(table_name): Path<String>,
) -> ApiResult<Json<ColumnsResponse>> {
    const OPERATION: &str = "get_columns";
    tracing::info!(table = %table_name, "fetching columns");

    finish(OPERATION, &table_name, validate_identifier(&table_name).map(|_| ()))?;

    let mut session = open_session(&state, OPERATION, &table_name).await?;
    let result = handler::get_columns(&mut session, &table_name).await;
    session.close().await;

    let columns = finish(OPERATION, &table_name, result)?;
    Ok(Json(ColumnsResponse { columns }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCatalog, MemoryProvider};

    #[test]
    fn test_router_builds() {
        let provider = MemoryProvider::new(MemoryCatalog::new("public", "geom"));
        let state = Arc::new(SpatialState::new(provider, LayerRegistry::default()));
        let _router = spatial_routes(state);
    }
}
