use rusqlite::Connection;
use tracing::{debug, error, info, trace};

use super::{Introspector, TableFilter};
use crate::prelude::{DbtogoError, Placeholder};
use crate::schema::{Field, Struct};
use crate::types::{DataType, ExternalType};

const BACKEND: &str = "sqlite3";

/// SQLite introspector
pub struct SqliteIntrospector<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteIntrospector<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Introspector for SqliteIntrospector<'_> {
    fn introspect(
        &mut self,
        schema_name: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Struct>, DbtogoError> {
        info!(schema = ?schema_name, "Starting schema introspection");

        let table_names: Vec<String> = query_tables(self.conn, schema_name)?
            .into_iter()
            .filter(|name| filter.should_include(name))
            .collect();
        debug!(count = ?table_names.len(), "Tables after filtering");

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            let fields = query_columns(self.conn, schema_name, &table_name)?;
            trace!(table = ?table_name, columns = ?fields.len(), "Found columns");
            tables.push(Struct::new(table_name, fields));
        }

        info!(
            schema = ?schema_name,
            tables = ?tables.len(),
            "Schema introspection complete"
        );
        Ok(tables)
    }

    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    fn default_schema(&self) -> &'static str {
        "main"
    }
}

fn introspection_error(context: &str, err: rusqlite::Error) -> DbtogoError {
    error!(error = ?err, "{}", context);
    DbtogoError::Introspection {
        backend: BACKEND.to_string(),
        message: format!("{}: {}", context, err),
    }
}

/// User tables in a schema, ordered by name
fn query_tables(conn: &Connection, schema_name: &str) -> Result<Vec<String>, DbtogoError> {
    let sql = format!(
        "SELECT name FROM \"{}\".sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
        schema_name.replace('"', "\"\"")
    );
    trace!(sql = ?sql, "Querying tables");

    let context = format!("Failed to query tables in '{}'", schema_name);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| introspection_error(&context, e))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| introspection_error(&context, e))?;

    trace!(tables = ?names, "Tables found");
    Ok(names)
}

/// Columns of one table in declaration order
fn query_columns(
    conn: &Connection,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<Field>, DbtogoError> {
    let sql = r#"
        SELECT name, type, "notnull"
        FROM pragma_table_info(?1, ?2)
        ORDER BY cid
    "#;

    let context = format!("Failed to query columns for table '{}'", table_name);
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| introspection_error(&context, e))?;
    let rows = stmt
        .query_map([table_name, schema_name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| introspection_error(&context, e))?;

    let fields = rows
        .into_iter()
        .map(|(name, native_type, not_null)| {
            let data_type = affinity(&native_type);
            trace!(
                column = ?name,
                data_type = ?native_type,
                parsed_type = ?data_type,
                is_nullable = ?!not_null,
                "Parsed column"
            );
            Field::new(name, native_type, data_type).nullable(!not_null)
        })
        .collect();
    Ok(fields)
}

/// Map a declared column type using SQLite's affinity rules
///
/// The first four rules are SQLite's own. Booleans and dates get their own
/// kinds before the NUMERIC fallback.
fn affinity(declared: &str) -> DataType {
    let upper = declared.to_uppercase();
    let has = |needle: &str| upper.contains(needle);

    if has("INT") {
        DataType::Int64
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        DataType::String
    } else if has("BLOB") || upper.trim().is_empty() {
        DataType::Bytes
    } else if has("REAL") || has("FLOA") || has("DOUB") {
        DataType::Float64
    } else if has("BOOL") {
        DataType::Bool
    } else if has("DATE") || has("TIME") {
        DataType::External(ExternalType::time())
    } else {
        DataType::Float64
    }
}
