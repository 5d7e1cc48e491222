//! Schema data structures
//!
//! These types form the contract between introspection (produces raw names
//! and resolved kinds) and metadata enrichment (fills in the derived parts).

use crate::types::DataType;

/// A database table
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    /// Table name as reported by the backend
    pub name: String,
    /// Generated type name, filled by enrichment
    pub clean_name: String,
    /// Columns in schema order
    pub fields: Vec<Field>,
}

impl Struct {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            clean_name: String::new(),
            fields,
        }
    }
}

/// A table column
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name as reported by the backend
    pub name: String,
    /// Type name as reported by the backend, kept for templates and logs
    pub native_type: String,
    pub data_type: DataType,
    /// Whether the backend allows NULL in this column
    pub is_nullable: bool,

    // Filled by enrichment
    pub clean_name: String,
    /// Type expression under the active policy
    pub go_type: String,
    /// Positional SQL placeholder for this column
    pub placeholder: String,
    /// Struct tag, including the leading space, or empty
    pub tag: String,
}

impl Field {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            data_type,
            is_nullable: false,
            clean_name: String::new(),
            go_type: String::new(),
            placeholder: String::new(),
            tag: String::new(),
        }
    }

    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }
}
