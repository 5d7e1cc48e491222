//! Database introspection
//!
//! This module reads table and column metadata from live databases. Each
//! supported backend has its own feature-gated submodule.

use crate::prelude::{DbtogoError, Placeholder, Struct};

/// Filters to apply during introspection
#[derive(Debug, Default, Clone)]
pub struct TableFilter {
    /// Only include these tables (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these tables
    pub exclude: Option<Vec<String>>,
}

impl TableFilter {
    /// Check if a table should be included
    pub fn should_include(&self, table_name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.iter().any(|t| t == table_name) {
                return false;
            }
        }

        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|t| t == table_name) {
                return false;
            }
        }

        true
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

/// Trait for database introspection implementations
pub trait Introspector {
    /// Read every table in `schema_name` that passes `filter`
    ///
    /// Tables come back ordered by name, columns in declaration order. Only
    /// raw names and resolved kinds are filled in.
    fn introspect(
        &mut self,
        schema_name: &str,
        filter: &TableFilter,
    ) -> Result<Vec<Struct>, DbtogoError>;

    /// Placeholder style the backend's driver expects
    fn placeholder(&self) -> Placeholder;

    /// Schema used when none is given
    fn default_schema(&self) -> &'static str;
}

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresIntrospector;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIntrospector;
