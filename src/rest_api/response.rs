//! # Response Formatting
//!
//! Response bodies of the listing endpoints. Feature endpoints return the
//! GeoJSON document itself.

use serde::Serialize;

use crate::store::ColumnDescriptor;

#[derive(Debug, Clone, Serialize)]
pub struct LayersResponse {
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatesResponse {
    pub states: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictsResponse {
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnDescriptor>,
}
