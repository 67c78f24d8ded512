//! Syntactic guards for caller-supplied identifiers and dates.
//!
//! Table and column names cannot be bound as query parameters, so they are
//! restricted to letters, digits, underscores and spaces before any catalog
//! lookup happens.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{ApiError, ApiResult};

static IDENTIFIER_PATTERN: OnceLock<Regex> = OnceLock::new();
static DATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_ ]+$").expect("identifier pattern compiles"))
}

fn date_pattern() -> &'static Regex {
    DATE_PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles"))
}

/// Returns `true` if `name` only contains `[A-Za-z0-9_ ]` and is non-empty.
pub fn is_safe_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// Accepts a table or column name that is safe to quote into SQL text.
///
/// Passing this check does not make a name usable in a query by itself;
/// it must also be found in the catalog (see [`super::validator`]).
pub fn validate_identifier(name: &str) -> ApiResult<&str> {
    if is_safe_identifier(name) {
        Ok(name)
    } else {
        Err(ApiError::invalid_table_name())
    }
}

/// Accepts a `YYYY-MM-DD` shaped date.
///
/// Only the shape is checked: `2024-13-40` passes here and is left for the
/// database to reject.
pub fn validate_date(value: &str) -> ApiResult<&str> {
    if date_pattern().is_match(value) {
        Ok(value)
    } else {
        Err(ApiError::InvalidArgument(
            "Invalid date format. Use YYYY-MM-DD".to_string(),
        ))
    }
}
