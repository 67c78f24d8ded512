//! # Spatial Catalog
//!
//! Validation of the identifiers that end up quoted into generated SQL.
//!
//! Two layers:
//!
//! - `identifier`: syntactic guard (`^[A-Za-z0-9_ ]+$`) and date shape check
//! - `validator`: existence checks against `geometry_columns` and
//!   `information_schema.columns`, producing [`TableName`] / [`ColumnName`]

pub mod identifier;
pub mod validator;

pub use identifier::{is_safe_identifier, validate_date, validate_identifier};
pub use validator::{
    geometry_column, list_columns, require_table, resolve_column, resolve_table, ColumnName,
    TableName,
};
