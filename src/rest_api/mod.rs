//! # Spatial REST API Module
//!
//! Request parameters, per-endpoint pipelines and response bodies for the
//! read-only layer API. The axum wiring lives in `http_server`.

pub mod handler;
pub mod parser;
pub mod response;

pub use parser::{parse_page, DistrictParams, FilterParams};
pub use response::{ColumnsResponse, DistrictsResponse, LayersResponse, StatesResponse};
