//! # API Errors
//!
//! Error types shared by the catalog, store and HTTP layers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type for request pipelines
pub type ApiResult<T> = Result<T, ApiError>;

/// Request errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Malformed identifier, date or query parameter
    #[error("{0}")]
    InvalidArgument(String),

    /// Table absent from the spatial catalog
    #[error("{0}")]
    NotFound(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Database connection could not be established
    #[error("Database connection failed: {0}")]
    ServiceUnavailable(String),

    /// Query execution or any other failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_table_name() -> Self {
        ApiError::InvalidArgument("Invalid table name".to_string())
    }

    pub fn table_not_found(table: &str) -> Self {
        ApiError::NotFound(format!("Table '{}' not found", table))
    }

    pub fn missing_param(name: &str) -> Self {
        ApiError::InvalidArgument(format!("Missing required parameter: {}", name))
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
