//! # Query Module
//!
//! SQL for the spatial API: fixed catalog statements, the dynamic
//! distinct-value and feature statements, and the GeoJSON shapes they
//! produce.

pub mod builder;
pub mod catalog;
pub mod geojson;

pub use builder::{
    quote_ident, quote_literal, BindValue, DateRange, DistinctColumn, DistinctQuery,
    FeatureFilter, FeatureQuery, Page, SqlQuery, DEFAULT_LIMIT,
};
pub use geojson::{Feature, FeatureCollection};
