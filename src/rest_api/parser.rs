//! # Query Parameter Parser
//!
//! Parses query strings into typed request parameters.
//!
//! Syntactic checks (identifiers, date shape, integers) all happen here,
//! before a connection is opened.

use std::collections::HashMap;

use crate::catalog::{validate_date, validate_identifier};
use crate::errors::{ApiError, ApiResult};
use crate::query::{Page, DEFAULT_LIMIT};

/// Parameters of `/api/districts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictParams {
    /// Syntactically valid layer names, in request order
    pub layers: Vec<String>,
    pub state: Option<String>,
}

impl DistrictParams {
    pub fn parse(params: &HashMap<String, String>) -> ApiResult<Self> {
        let layers = required(params, "layers")?;
        Ok(Self {
            layers: parse_layers(layers)?,
            state: optional(params, "state"),
        })
    }
}

/// Parameters of `/api/filter/{table}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub start_date: String,
    pub end_date: String,
    pub state: Option<String>,
    pub district: Option<String>,
    pub page: Page,
}

impl FilterParams {
    pub fn parse(params: &HashMap<String, String>) -> ApiResult<Self> {
        let start_date = validate_date(required(params, "start_date")?)?;
        let end_date = validate_date(required(params, "end_date")?)?;

        Ok(Self {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            state: optional(params, "state"),
            district: optional(params, "district"),
            page: parse_page(params)?,
        })
    }
}

/// `limit` (default 1000) and `offset` (default 0).
pub fn parse_page(params: &HashMap<String, String>) -> ApiResult<Page> {
    let limit = match params.get("limit") {
        Some(value) => parse_non_negative("limit", value)?,
        None => DEFAULT_LIMIT,
    };
    let offset = match params.get("offset") {
        Some(value) => parse_non_negative("offset", value)?,
        None => 0,
    };
    Ok(Page { limit, offset })
}

/// Splits the comma-separated layer list.
///
/// Empty entries are dropped; every other entry must be a safe identifier.
fn parse_layers(value: &str) -> ApiResult<Vec<String>> {
    value
        .split(',')
        .filter(|layer| !layer.is_empty())
        .map(|layer| validate_identifier(layer).map(str::to_string))
        .collect()
}

fn parse_non_negative(name: &str, value: &str) -> ApiResult<i64> {
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ApiError::InvalidArgument(format!(
            "Invalid {}: {}",
            name, value
        ))),
    }
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> ApiResult<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ApiError::missing_param(name))
}

/// Absent and empty values both mean "no filter".
fn optional(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name).filter(|value| !value.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_page_defaults() {
        let page = parse_page(&HashMap::new()).unwrap();
        assert_eq!(page, Page { limit: 1000, offset: 0 });
    }

    #[test]
    fn test_page_values() {
        let page = parse_page(&params(&[("limit", "25"), ("offset", "50")])).unwrap();
        assert_eq!(page, Page { limit: 25, offset: 50 });
    }

    #[test]
    fn test_page_rejects_garbage() {
        for (key, value) in [("limit", "ten"), ("limit", "-1"), ("offset", "1.5"), ("offset", "")] {
            let err = parse_page(&params(&[(key, value)])).unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "{}={}", key, value);
        }
    }

    #[test]
    fn test_district_params() {
        let parsed = DistrictParams::parse(&params(&[("layers", "neinput,jkinput"), ("state", "Assam")])).unwrap();
        assert_eq!(parsed.layers, vec!["neinput", "jkinput"]);
        assert_eq!(parsed.state.as_deref(), Some("Assam"));
    }

    #[test]
    fn test_district_params_skip_empty_entries() {
        let parsed = DistrictParams::parse(&params(&[("layers", ""), ("state", "")])).unwrap();
        assert!(parsed.layers.is_empty());
        assert_eq!(parsed.state, None);

        let parsed = DistrictParams::parse(&params(&[("layers", "a,,b,")])).unwrap();
        assert_eq!(parsed.layers, vec!["a", "b"]);
    }

    #[test]
    fn test_district_params_reject_bad_layer() {
        let err = DistrictParams::parse(&params(&[("layers", "neinput,x;DROP")])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn test_district_params_require_layers() {
        let err = DistrictParams::parse(&HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: layers");
    }

    #[test]
    fn test_filter_params() {
        let parsed = FilterParams::parse(&params(&[
            ("start_date", "2024-01-01"),
            ("end_date", "2024-12-31"),
            ("district", "Kohima"),
            ("limit", "10"),
        ]))
        .unwrap();

        assert_eq!(parsed.start_date, "2024-01-01");
        assert_eq!(parsed.end_date, "2024-12-31");
        assert_eq!(parsed.state, None);
        assert_eq!(parsed.district.as_deref(), Some("Kohima"));
        assert_eq!(parsed.page, Page { limit: 10, offset: 0 });
    }

    #[test]
    fn test_filter_params_date_shape() {
        let err = FilterParams::parse(&params(&[("start_date", "01-01-2024"), ("end_date", "2024-12-31")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format. Use YYYY-MM-DD");

        let err = FilterParams::parse(&params(&[("start_date", "2024-01-01")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: end_date");

        // Shape only
        assert!(FilterParams::parse(&params(&[("start_date", "2024-13-40"), ("end_date", "2024-12-31")])).is_ok());
    }
}
