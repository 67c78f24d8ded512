//! Identifier Invariant Tests
//!
//! Table and column names reach SQL text only after passing the syntactic
//! check and being found in the catalog.

use geoportal::catalog::{
    geometry_column, is_safe_identifier, list_columns, require_table, resolve_column,
    resolve_table, validate_identifier,
};
use geoportal::errors::ApiError;
use geoportal::query::{FeatureQuery, Page};
use geoportal::store::{ConnectionProvider, MemoryCatalog, MemoryProvider, MemoryTable, SpatialSession};

const HOSTILE_NAMES: &[&str] = &[
    "",
    "neinput;DROP TABLE neinput",
    "neinput--",
    "\"neinput\"",
    "public.neinput",
    "neinput'",
    "neinput\n",
    "ne/input",
    "neïnput",
];

fn provider() -> MemoryProvider {
    MemoryProvider::new(
        MemoryCatalog::new("public", "geom")
            .with_table(
                "neinput",
                MemoryTable::new().column("id", "integer").column("state", "text"),
            )
            .with_table(
                "Patrol Routes",
                MemoryTable::new().column("route name", "text"),
            ),
    )
}

#[test]
fn test_hostile_names_rejected() {
    for name in HOSTILE_NAMES {
        assert!(!is_safe_identifier(name), "accepted {:?}", name);
        let err = validate_identifier(name).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert_eq!(err.to_string(), "Invalid table name");
    }
}

#[test]
fn test_spaces_digits_underscores_accepted() {
    for name in ["neinput", "Patrol Routes", "layer_2024", "42"] {
        assert_eq!(validate_identifier(name).unwrap(), name);
    }
}

#[tokio::test]
async fn test_hostile_names_never_resolve() {
    let provider = provider();
    let mut session = provider.connect().await.unwrap();

    for name in HOSTILE_NAMES {
        let err = resolve_table(&mut session, name).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    session.close().await;
}

#[tokio::test]
async fn test_safe_but_unknown_names_do_not_resolve() {
    let provider = provider();
    let mut session = provider.connect().await.unwrap();

    assert!(resolve_table(&mut session, "jkinput").await.unwrap().is_none());
    let err = require_table(&mut session, "jkinput").await.unwrap_err();
    assert_eq!(err.to_string(), "Table 'jkinput' not found");

    let table = require_table(&mut session, "neinput").await.unwrap();
    assert!(resolve_column(&mut session, &table, "missiondate")
        .await
        .unwrap()
        .is_none());

    session.close().await;
}

#[tokio::test]
async fn test_resolved_names_are_quoted_into_sql() {
    let provider = provider();
    let mut session = provider.connect().await.unwrap();

    let table = require_table(&mut session, "Patrol Routes").await.unwrap();
    let geometry = geometry_column(&mut session, &table).await.unwrap();
    let columns = list_columns(&mut session, &table).await.unwrap();
    session.close().await;

    let sql = FeatureQuery::new(table, geometry, columns, Page::default()).to_sql();
    assert!(sql.sql.contains("FROM \"public\".\"Patrol Routes\""));
    assert!(sql.sql.contains("'route name', t.\"route name\""));
    assert!(!sql.sql.contains("ORDER BY"));
}
