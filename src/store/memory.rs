//! In-memory spatial store.
//!
//! Evaluates distinct-value and feature queries directly over static rows,
//! mirroring what PostGIS returns for the same statements. Used by the
//! endpoint tests; it also counts open sessions so tests can check that
//! every request path closes its connection.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{ApiError, ApiResult};
use crate::query::{DistinctQuery, Feature, FeatureCollection, FeatureFilter, FeatureQuery};

use super::{ColumnDescriptor, ConnectionProvider, SpatialSession};

#[derive(Debug, Clone)]
struct MemoryRow {
    geometry: Value,
    properties: Map<String, Value>,
}

/// A spatial table: non-geometry columns plus rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<MemoryRow>,
    failure: Option<String>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnDescriptor::new(name, data_type));
        self
    }

    /// Adds a row; `properties` must be a JSON object.
    pub fn row(mut self, geometry: Value, properties: Value) -> Self {
        let properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.rows.push(MemoryRow {
            geometry,
            properties,
        });
        self
    }

    /// Every data query against this table fails with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }
}

/// The tables visible through `geometry_columns`.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    schema: String,
    geometry_column: String,
    tables: BTreeMap<String, MemoryTable>,
}

impl MemoryCatalog {
    pub fn new(schema: &str, geometry_column: &str) -> Self {
        Self {
            schema: schema.to_string(),
            geometry_column: geometry_column.to_string(),
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, name: &str, table: MemoryTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    fn table(&self, name: &str) -> ApiResult<&MemoryTable> {
        let table = self
            .tables
            .get(name)
            .ok_or_else(|| ApiError::Internal(format!("relation \"{}\" does not exist", name)))?;
        match &table.failure {
            Some(message) => Err(ApiError::Internal(message.clone())),
            None => Ok(table),
        }
    }
}

/// Hands out [`MemorySession`]s over a shared read-only catalog.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    catalog: Arc<MemoryCatalog>,
    open_sessions: Arc<AtomicUsize>,
    unavailable: Option<String>,
}

impl MemoryProvider {
    pub fn new(catalog: MemoryCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            open_sessions: Arc::new(AtomicUsize::new(0)),
            unavailable: None,
        }
    }

    /// A provider whose every `connect` fails with `message`.
    pub fn unavailable(catalog: MemoryCatalog, message: &str) -> Self {
        Self {
            unavailable: Some(message.to_string()),
            ..Self::new(catalog)
        }
    }

    /// Sessions connected but not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(AtomicOrdering::SeqCst)
    }
}

impl ConnectionProvider for MemoryProvider {
    type Session = MemorySession;

    async fn connect(&self) -> ApiResult<MemorySession> {
        if let Some(message) = &self.unavailable {
            return Err(ApiError::ServiceUnavailable(message.clone()));
        }
        self.open_sessions.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(MemorySession {
            catalog: Arc::clone(&self.catalog),
            open_sessions: Arc::clone(&self.open_sessions),
        })
    }
}

pub struct MemorySession {
    catalog: Arc<MemoryCatalog>,
    open_sessions: Arc<AtomicUsize>,
}

impl SpatialSession for MemorySession {
    fn schema(&self) -> &str {
        &self.catalog.schema
    }

    fn geometry_column(&self) -> &str {
        &self.catalog.geometry_column
    }

    async fn list_layers(&mut self) -> ApiResult<Vec<String>> {
        Ok(self.catalog.tables.keys().cloned().collect())
    }

    async fn table_exists(&mut self, table: &str) -> ApiResult<bool> {
        Ok(self.catalog.tables.contains_key(table))
    }

    async fn column_exists(&mut self, table: &str, column: &str) -> ApiResult<bool> {
        Ok(self.catalog.tables.get(table).is_some_and(|t| {
            column == self.catalog.geometry_column || t.has_column(column)
        }))
    }

    async fn describe_columns(&mut self, table: &str) -> ApiResult<Vec<ColumnDescriptor>> {
        Ok(self
            .catalog
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn distinct_values(&mut self, query: &DistinctQuery) -> ApiResult<Vec<String>> {
        let column = query.column.as_str();
        let mut values = BTreeSet::new();

        for source in &query.sources {
            let table = self.catalog.table(source.name())?;
            if !table.has_column(column) {
                return Err(ApiError::Internal(format!(
                    "column \"{}\" does not exist",
                    column
                )));
            }
            for row in &table.rows {
                if let Some(state) = &query.state {
                    if row.properties.get("state").and_then(Value::as_str) != Some(state.as_str()) {
                        continue;
                    }
                }
                match row.properties.get(column) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(value)) => {
                        values.insert(value.clone());
                    }
                    Some(other) => {
                        values.insert(other.to_string());
                    }
                }
            }
        }

        Ok(values.into_iter().collect())
    }

    async fn feature_collection(&mut self, query: &FeatureQuery) -> ApiResult<Option<Value>> {
        let table = self.catalog.table(query.table.name())?;
        if let Some(filter) = &query.filter {
            // Bounds are cast once, whether or not any row is compared
            parse_date(&filter.date_range.start)?;
            parse_date(&filter.date_range.end)?;
        }

        let mut matched = Vec::new();
        for row in &table.rows {
            if row_matches(row, query.filter.as_ref())? {
                matched.push(row);
            }
        }
        if query.id_column().is_some() {
            matched.sort_by(|a, b| compare_values(a.properties.get("id"), b.properties.get("id")));
        }

        let offset = usize::try_from(query.page.offset).unwrap_or(0);
        let limit = usize::try_from(query.page.limit).unwrap_or(0);
        let features: Vec<Feature> = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                let properties = query
                    .columns
                    .iter()
                    .map(|column| {
                        let value = row.properties.get(column.as_str()).cloned();
                        (column.to_string(), value.unwrap_or(Value::Null))
                    })
                    .collect();
                let id = query
                    .id_column()
                    .and_then(|column| row.properties.get(column.as_str()).cloned())
                    .unwrap_or(Value::Null);
                Feature::new(row.geometry.clone(), properties, id)
            })
            .collect();

        if features.is_empty() {
            Ok(None)
        } else {
            Ok(Some(FeatureCollection::new(features).to_value()))
        }
    }

    async fn close(self) {
        self.open_sessions.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}

fn row_matches(row: &MemoryRow, filter: Option<&FeatureFilter>) -> ApiResult<bool> {
    let Some(filter) = filter else {
        return Ok(true);
    };

    let start = parse_date(&filter.date_range.start)?;
    let end = parse_date(&filter.date_range.end)?;
    let date = match row
        .properties
        .get(filter.date_range.column.as_str())
        .and_then(Value::as_str)
    {
        Some(value) => parse_date(value.get(..10).unwrap_or(value))?,
        None => return Ok(false),
    };
    if date < start || date > end {
        return Ok(false);
    }

    let attribute_matches = |column: &str, expected: &Option<String>| match expected {
        Some(expected) => row.properties.get(column).and_then(Value::as_str) == Some(expected.as_str()),
        None => true,
    };
    Ok(attribute_matches("state", &filter.state) && attribute_matches("district", &filter.district))
}

/// Parses `YYYY-MM-DD`, rejecting out-of-range months and days.
fn parse_date(value: &str) -> ApiResult<(u32, u32, u32)> {
    let out_of_range =
        || ApiError::Internal(format!("date/time field value out of range: \"{}\"", value));

    let mut parts = value.splitn(3, '-').map(str::parse::<u32>);
    let (Some(Ok(year)), Some(Ok(month)), Some(Ok(day))) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(out_of_range());
    };
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(out_of_range());
    }
    Ok((year, month, day))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => a.map(Value::to_string).cmp(&b.map(Value::to_string)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_ranges() {
        assert_eq!(parse_date("2024-02-29").unwrap(), (2024, 2, 29));
        assert!(parse_date("2024-13-40").is_err());
        assert!(parse_date("2024-00-10").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[tokio::test]
    async fn test_session_counting() {
        let provider = MemoryProvider::new(MemoryCatalog::new("public", "geom"));
        let first = provider.connect().await.unwrap();
        let second = provider.connect().await.unwrap();
        assert_eq!(provider.open_sessions(), 2);

        first.close().await;
        second.close().await;
        assert_eq!(provider.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        let provider = MemoryProvider::unavailable(MemoryCatalog::new("public", "geom"), "refused");
        let err = provider.connect().await.err().unwrap();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert_eq!(provider.open_sessions(), 0);
    }
}
