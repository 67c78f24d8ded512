//! # SQL Builder
//!
//! Assembles the dynamic statements: distinct-value listings across several
//! layers and GeoJSON feature projections with optional date/attribute
//! filters.
//!
//! Identifiers only enter SQL text through [`TableName`] and [`ColumnName`],
//! always double-quoted. Caller-supplied values are always bind parameters.

use crate::catalog::{ColumnName, TableName};

/// Default page size for feature queries
pub const DEFAULT_LIMIT: i64 = 1000;

/// `json_build_object` takes at most 100 arguments, i.e. 50 key/value pairs.
const MAX_PROPERTY_PAIRS: usize = 50;

const STATE_COLUMN: &str = "state";
const DISTRICT_COLUMN: &str = "district";

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

/// Statement text plus its bind values, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl SqlQuery {
    /// Registers a bind value and returns its placeholder.
    fn bind(&mut self, value: BindValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

/// Quotes an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn qualified(table: &TableName) -> String {
    format!("{}.{}", quote_ident(table.schema()), quote_ident(table.name()))
}

// ==================
// Distinct values
// ==================

/// Attribute listed by a [`DistinctQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctColumn {
    State,
    District,
}

impl DistinctColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistinctColumn::State => STATE_COLUMN,
            DistinctColumn::District => DISTRICT_COLUMN,
        }
    }
}

/// Sorted distinct non-null values of one attribute across several layers.
#[derive(Debug, Clone)]
pub struct DistinctQuery {
    pub column: DistinctColumn,
    pub sources: Vec<TableName>,
    /// Restricts every source to `state = ?`
    pub state: Option<String>,
}

impl DistinctQuery {
    pub fn states(sources: Vec<TableName>) -> Self {
        Self {
            column: DistinctColumn::State,
            sources,
            state: None,
        }
    }

    pub fn districts(sources: Vec<TableName>, state: Option<String>) -> Self {
        Self {
            column: DistinctColumn::District,
            sources,
            state,
        }
    }

    /// `None` when there are no sources to union.
    pub fn to_sql(&self) -> Option<SqlQuery> {
        if self.sources.is_empty() {
            return None;
        }

        let mut query = SqlQuery::default();
        let column = quote_ident(self.column.as_str());
        let mut subqueries = Vec::with_capacity(self.sources.len());

        for table in &self.sources {
            let mut subquery = format!(
                "SELECT {column}::text AS item FROM {} WHERE {column} IS NOT NULL",
                qualified(table),
            );
            if let Some(state) = &self.state {
                // One copy of the value per subquery
                let placeholder = query.bind(BindValue::Text(state.clone()));
                subquery.push_str(&format!(
                    " AND {} = {}",
                    quote_ident(STATE_COLUMN),
                    placeholder
                ));
            }
            subqueries.push(subquery);
        }

        query.sql = format!(
            "SELECT DISTINCT item FROM ({}) AS items ORDER BY item",
            subqueries.join(" UNION ")
        );
        Some(query)
    }
}

// ==================
// Features
// ==================

/// LIMIT / OFFSET of a feature query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Inclusive date range on a layer's date column.
#[derive(Debug, Clone)]
pub struct DateRange {
    pub column: ColumnName,
    pub start: String,
    pub end: String,
}

/// Filters of `/api/filter/{table}`.
#[derive(Debug, Clone)]
pub struct FeatureFilter {
    pub date_range: DateRange,
    pub state: Option<String>,
    pub district: Option<String>,
}

/// A page of one layer projected as a GeoJSON FeatureCollection.
#[derive(Debug, Clone)]
pub struct FeatureQuery {
    pub table: TableName,
    pub geometry: ColumnName,
    /// Non-geometry columns, copied into `properties`
    pub columns: Vec<ColumnName>,
    pub filter: Option<FeatureFilter>,
    pub page: Page,
}

impl FeatureQuery {
    pub fn new(table: TableName, geometry: ColumnName, columns: Vec<ColumnName>, page: Page) -> Self {
        Self {
            table,
            geometry,
            columns,
            filter: None,
            page,
        }
    }

    pub fn with_filter(mut self, filter: FeatureFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The `id` column, if the layer has one.
    pub fn id_column(&self) -> Option<&ColumnName> {
        self.columns.iter().find(|column| column.as_str() == "id")
    }

    /// Builds the aggregate statement.
    ///
    /// Rows are paged in a subquery before aggregation. `HAVING count(*) > 0`
    /// makes an empty page return no row instead of a null `features` array.
    pub fn to_sql(&self) -> SqlQuery {
        let mut query = SqlQuery::default();
        let mut rows = format!("SELECT * FROM {}", qualified(&self.table));

        if let Some(filter) = &self.filter {
            let start = query.bind(BindValue::Text(filter.date_range.start.clone()));
            let end = query.bind(BindValue::Text(filter.date_range.end.clone()));
            rows.push_str(&format!(
                " WHERE {}::date BETWEEN {}::date AND {}::date",
                quote_ident(filter.date_range.column.as_str()),
                start,
                end
            ));
            if let Some(state) = &filter.state {
                let placeholder = query.bind(BindValue::Text(state.clone()));
                rows.push_str(&format!(" AND {} = {}", quote_ident(STATE_COLUMN), placeholder));
            }
            if let Some(district) = &filter.district {
                let placeholder = query.bind(BindValue::Text(district.clone()));
                rows.push_str(&format!(
                    " AND {} = {}",
                    quote_ident(DISTRICT_COLUMN),
                    placeholder
                ));
            }
        }

        if let Some(id) = self.id_column() {
            rows.push_str(&format!(" ORDER BY {}", quote_ident(id.as_str())));
        }

        let limit = query.bind(BindValue::Int(self.page.limit));
        let offset = query.bind(BindValue::Int(self.page.offset));
        rows.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

        let id = self
            .id_column()
            .map(|column| format!("t.{}", quote_ident(column.as_str())))
            .unwrap_or_else(|| "NULL".to_string());

        query.sql = format!(
            "SELECT json_build_object(\
                'type', 'FeatureCollection', \
                'features', json_agg(json_build_object(\
                    'type', 'Feature', \
                    'geometry', ST_AsGeoJSON(t.{geometry})::json, \
                    'properties', {properties}, \
                    'id', {id}\
                ))\
            ) AS geojson \
            FROM ({rows}) AS t \
            HAVING count(*) > 0",
            geometry = quote_ident(self.geometry.as_str()),
            properties = properties_expr(&self.columns),
        );
        query
    }
}

/// `json_build_object('col', t."col", ...)`, split into `jsonb` chunks
/// joined with `||` past the function argument limit.
fn properties_expr(columns: &[ColumnName]) -> String {
    let chunks: Vec<String> = columns
        .chunks(MAX_PROPERTY_PAIRS)
        .map(|chunk| {
            chunk
                .iter()
                .map(|column| {
                    format!(
                        "{}, t.{}",
                        quote_literal(column.as_str()),
                        quote_ident(column.as_str())
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();

    match chunks.as_slice() {
        [] => "json_build_object()".to_string(),
        [single] => format!("json_build_object({})", single),
        many => format!(
            "({})::json",
            many.iter()
                .map(|chunk| format!("jsonb_build_object({})", chunk))
                .collect::<Vec<_>>()
                .join(" || ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{geometry_column, list_columns, require_table, resolve_column};
    use crate::store::memory::{MemoryCatalog, MemoryProvider, MemoryTable};
    use crate::store::ConnectionProvider;

    fn provider() -> MemoryProvider {
        let wide = (0..120).fold(MemoryTable::new(), |table, i| {
            table.column(&format!("c{}", i), "integer")
        });
        MemoryProvider::new(
            MemoryCatalog::new("public", "geom")
                .with_table(
                    "neinput",
                    MemoryTable::new()
                        .column("id", "integer")
                        .column("inputdate", "date")
                        .column("state", "text")
                        .column("district", "text"),
                )
                .with_table("jkinput", MemoryTable::new().column("district", "text"))
                .with_table("wide", wide),
        )
    }

    async fn feature_query(table: &str) -> FeatureQuery {
        let provider = provider();
        let mut session = provider.connect().await.unwrap();
        let table = require_table(&mut session, table).await.unwrap();
        let geometry = geometry_column(&mut session, &table).await.unwrap();
        let columns = list_columns(&mut session, &table).await.unwrap();
        FeatureQuery::new(table, geometry, columns, Page::default())
    }

    async fn tables(names: &[&str]) -> Vec<TableName> {
        let provider = provider();
        let mut session = provider.connect().await.unwrap();
        let mut tables = Vec::new();
        for name in names {
            tables.push(require_table(&mut session, name).await.unwrap());
        }
        tables
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("Layer 1"), "\"Layer 1\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_distinct_without_sources() {
        assert!(DistinctQuery::districts(Vec::new(), Some("Assam".into()))
            .to_sql()
            .is_none());
    }

    #[tokio::test]
    async fn test_district_union_binds_state_per_subquery() {
        let query = DistinctQuery::districts(tables(&["neinput", "jkinput"]).await, Some("Assam".into()))
            .to_sql()
            .unwrap();

        assert_eq!(
            query.sql,
            "SELECT DISTINCT item FROM (\
             SELECT \"district\"::text AS item FROM \"public\".\"neinput\" WHERE \"district\" IS NOT NULL AND \"state\" = $1 \
             UNION \
             SELECT \"district\"::text AS item FROM \"public\".\"jkinput\" WHERE \"district\" IS NOT NULL AND \"state\" = $2\
             ) AS items ORDER BY item"
        );
        assert_eq!(
            query.params,
            vec![
                BindValue::Text("Assam".into()),
                BindValue::Text("Assam".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_state_listing_has_no_params() {
        let query = DistinctQuery::states(tables(&["neinput"]).await).to_sql().unwrap();
        assert!(query.sql.contains("SELECT \"state\"::text AS item"));
        assert!(query.params.is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_feature_query() {
        let query = feature_query("neinput").await;
        let sql = query.to_sql();

        assert!(sql.sql.contains("ST_AsGeoJSON(t.\"geom\")::json"));
        assert!(sql.sql.contains(
            "json_build_object('id', t.\"id\", 'inputdate', t.\"inputdate\", 'state', t.\"state\", 'district', t.\"district\")"
        ));
        assert!(sql.sql.contains("'id', t.\"id\""));
        assert!(sql.sql.contains(
            "FROM (SELECT * FROM \"public\".\"neinput\" ORDER BY \"id\" LIMIT $1 OFFSET $2) AS t"
        ));
        assert!(sql.sql.ends_with("HAVING count(*) > 0"));
        assert_eq!(sql.params, vec![BindValue::Int(1000), BindValue::Int(0)]);
    }

    #[tokio::test]
    async fn test_filtered_feature_query_appends_optional_clauses() {
        let provider = provider();
        let mut session = provider.connect().await.unwrap();
        let base = feature_query("neinput").await;
        let date_column = resolve_column(&mut session, &base.table, "inputdate")
            .await
            .unwrap()
            .unwrap();

        let query = base
            .with_filter(FeatureFilter {
                date_range: DateRange {
                    column: date_column,
                    start: "2024-01-01".into(),
                    end: "2024-12-31".into(),
                },
                state: None,
                district: Some("Kohima".into()),
            })
            .to_sql();

        assert!(query.sql.contains(
            "WHERE \"inputdate\"::date BETWEEN $1::date AND $2::date AND \"district\" = $3 ORDER BY \"id\" LIMIT $4 OFFSET $5"
        ));
        assert!(!query.sql.contains("\"state\" = $"));
        assert_eq!(
            query.params,
            vec![
                BindValue::Text("2024-01-01".into()),
                BindValue::Text("2024-12-31".into()),
                BindValue::Text("Kohima".into()),
                BindValue::Int(1000),
                BindValue::Int(0),
            ]
        );
    }

    #[tokio::test]
    async fn test_values_never_interpolated() {
        let provider = provider();
        let mut session = provider.connect().await.unwrap();
        let base = feature_query("neinput").await;
        let date_column = resolve_column(&mut session, &base.table, "inputdate")
            .await
            .unwrap()
            .unwrap();
        let hostile = "x'; DROP TABLE neinput; --".to_string();

        let query = base
            .with_filter(FeatureFilter {
                date_range: DateRange {
                    column: date_column,
                    start: "2024-01-01".into(),
                    end: "2024-12-31".into(),
                },
                state: Some(hostile.clone()),
                district: Some(hostile.clone()),
            })
            .to_sql();

        assert!(!query.sql.contains("DROP TABLE"));
        assert!(query.params.contains(&BindValue::Text(hostile)));
    }

    #[tokio::test]
    async fn test_table_without_id_uses_null() {
        let sql = feature_query("jkinput").await.to_sql().sql;
        assert!(sql.contains("'id', NULL"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_wide_tables_are_chunked() {
        let sql = feature_query("wide").await.to_sql().sql;
        assert_eq!(sql.matches("jsonb_build_object(").count(), 3);
        assert!(sql.contains(")::json, 'id', NULL"));
        assert!(sql.contains("'c119', t.\"c119\""));
    }
}
