//! Fixed catalog queries.
//!
//! Every value is a bind parameter; none of these statements interpolate
//! identifiers.

/// `$1` = schema
pub const LIST_LAYERS: &str = "\
SELECT DISTINCT f_table_name::text AS layer \
FROM geometry_columns \
WHERE f_table_schema = $1 \
ORDER BY layer";

/// `$1` = schema, `$2` = table
pub const TABLE_EXISTS: &str = "\
SELECT 1 FROM geometry_columns \
WHERE f_table_schema = $1 AND f_table_name = $2 \
LIMIT 1";

/// `$1` = schema, `$2` = table, `$3` = column
pub const COLUMN_EXISTS: &str = "\
SELECT 1 FROM information_schema.columns \
WHERE table_schema = $1 AND table_name = $2 AND column_name = $3 \
LIMIT 1";

/// `$1` = schema, `$2` = table, `$3` = excluded geometry column
pub const DESCRIBE_COLUMNS: &str = "\
SELECT column_name::text, data_type::text \
FROM information_schema.columns \
WHERE table_schema = $1 AND table_name = $2 AND column_name <> $3 \
ORDER BY ordinal_position";
