//! geoportal - read-only GeoJSON API over PostGIS layers
//!
//! Serves spatial tables from a PostgreSQL/PostGIS catalog as GeoJSON
//! FeatureCollections, with date, state and district filtering.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod http_server;
pub mod logging;
pub mod query;
pub mod rest_api;
pub mod store;
