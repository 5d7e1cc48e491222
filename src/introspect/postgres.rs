use postgres::Client;
use tracing::{debug, error, info, trace};

use super::{Introspector, TableFilter};
use crate::prelude::{DbtogoError, Placeholder};
use crate::schema::{Field, Struct};
use crate::types::{DataType, ExternalType};

const BACKEND: &str = "postgresql";

/// PostgreSQL introspector
pub struct PostgresIntrospector<'a> {
    client: &'a mut Client,
}

impl<'a> PostgresIntrospector<'a> {
    pub fn new(client: &'a mut Client) -> Self {
        Self { client }
    }
}

impl Introspector for PostgresIntrospector<'_> {
    fn introspect(
        &mut self,
        schema_name: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Struct>, DbtogoError> {
        info!(schema = ?schema_name, "Starting schema introspection");

        let all_table_names = query_tables(self.client, schema_name)?;
        debug!(count = ?all_table_names.len(), "Found all tables");

        let table_names: Vec<String> = all_table_names
            .into_iter()
            .filter(|name| filter.should_include(name))
            .collect();
        debug!(count = ?table_names.len(), "Tables after filtering");

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            debug!(table = ?table_name, "Introspecting table");

            let fields = query_columns(self.client, schema_name, &table_name)?;
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
        Placeholder::Dollar
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }
}

fn introspection_error(message: String) -> DbtogoError {
    DbtogoError::Introspection {
        backend: BACKEND.to_string(),
        message,
    }
}

/// Query all table names in a schema
fn query_tables(client: &mut Client, schema_name: &str) -> Result<Vec<String>, DbtogoError> {
    trace!(schema = ?schema_name, "Querying tables");

    let sql = r#"
        SELECT c.relname AS table_name
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind = 'r'
            AND n.nspname = $1
        ORDER BY c.relname
    "#;

    let rows = client.query(sql, &[&schema_name]).map_err(|e| {
        error!(schema = ?schema_name, error = ?e, "Failed to query tables");
        introspection_error(format!("Failed to query tables in '{}': {}", schema_name, e))
    })?;

    let tables = rows.iter().map(|row| row.get("table_name")).collect();
    trace!(tables = ?tables, "Tables found");
    Ok(tables)
}

/// Query all columns for a table
fn query_columns(
    client: &mut Client,
    schema_name: &str,
    table_name: &str,
) -> Result<Vec<Field>, DbtogoError> {
    trace!(schema = ?schema_name, table = ?table_name, "Querying columns");

    let sql = r#"
        SELECT
            a.attname AS column_name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            NOT a.attnotnull AS is_nullable
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relname = $1
            AND n.nspname = $2
            AND a.attnum > 0
            AND NOT a.attisdropped
        ORDER BY a.attnum
    "#;

    let rows = client
        .query(sql, &[&table_name, &schema_name])
        .map_err(|e| {
            error!(
                schema = ?schema_name,
                table = ?table_name,
                error = ?e,
                "Failed to query columns"
            );
            introspection_error(format!(
                "Failed to query columns for table '{}': {}",
                table_name, e
            ))
        })?;

    let mut fields = Vec::with_capacity(rows.len());
    for row in rows {
        let column_name: String = row.get("column_name");
        let native_type: String = row.get("data_type");
        let is_nullable: bool = row.get("is_nullable");
        let data_type = parse_data_type(&native_type);

        trace!(
            column = ?column_name,
            data_type = ?native_type,
            parsed_type = ?data_type,
            is_nullable = ?is_nullable,
            "Parsed column"
        );

        fields.push(Field::new(column_name, native_type, data_type).nullable(is_nullable));
    }

    Ok(fields)
}

/// Parse `format_type` output into a DataType
///
/// Unknown names (enums, domains, extension types) map to strings.
fn parse_data_type(type_str: &str) -> DataType {
    let lower = type_str.to_lowercase();
    let trimmed = lower.trim();

    // Arrays first: "integer[]", "character varying(255)[]"
    if let Some(inner) = trimmed.strip_suffix("[]") {
        return DataType::Array(Box::new(parse_data_type(inner)));
    }

    let base = strip_modifier(trimmed);

    if base.starts_with("timestamp") || base.starts_with("time ") || base == "time" {
        return DataType::External(ExternalType::time());
    }

    match base {
        "smallint" | "int2" | "integer" | "int" | "int4" | "bigint" | "int8" | "smallserial"
        | "serial" | "bigserial" | "oid" => DataType::Int64,
        "boolean" | "bool" => DataType::Bool,
        "real" | "float4" | "double precision" | "float8" | "numeric" | "decimal"
        | "money" => DataType::Float64,
        "bytea" => DataType::Bytes,
        "date" | "timetz" => DataType::External(ExternalType::time()),
        "json" | "jsonb" => DataType::External(ExternalType::json()),
        _ => DataType::String,
    }
}

/// Drop a type modifier: "character varying(255)" -> "character varying"
///
/// Modifiers can sit in the middle, as in "timestamp(3) with time zone".
fn strip_modifier(type_str: &str) -> &str {
    match type_str.find('(') {
        Some(start) => type_str[..start].trim_end(),
        None => type_str,
    }
}
