//! # HTTP Server Module
//!
//! Axum server for the spatial layer API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/layers` - Spatial tables in the catalog
//! - `/api/states`, `/api/districts` - Filter values
//! - `/api/geojson/{table}`, `/api/filter/{table}` - FeatureCollections
//! - `/api/columns/{table}` - Attribute columns

pub mod config;
pub mod observability_routes;
pub mod server;
pub mod spatial_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use spatial_routes::SpatialState;
