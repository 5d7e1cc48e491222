//! Column type mapping
//!
//! Backends resolve native column types into a [`DataType`] once, while
//! introspecting. Everything downstream renders Go type expressions from it
//! under the [`TypePolicy`] chosen for the run.

use std::collections::BTreeSet;
use std::fmt;

/// Import path emitted whenever a `sql.Null*` wrapper is used
pub const SQL_PACKAGE: &str = "database/sql";

/// Semantic kind of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int64,
    Float64,
    String,
    /// Raw byte sequence (`[]byte`)
    Bytes,
    /// Sequence of another kind (`[]T`)
    Array(Box<DataType>),
    /// Named type defined in another Go package, e.g. `time.Time`
    External(ExternalType),
}

/// A Go type living outside the builtin set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalType {
    /// Import path of the defining package, e.g. `encoding/json`
    pub path: String,
    /// Type name inside that package, e.g. `RawMessage`
    pub name: String,
}

impl ExternalType {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// `time.Time`
    pub fn time() -> Self {
        Self::new("time", "Time")
    }

    /// `json.RawMessage`
    pub fn json() -> Self {
        Self::new("encoding/json", "RawMessage")
    }

    /// Package qualifier used in source, the last segment of the import path
    pub fn qualifier(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for ExternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qualifier(), self.name)
    }
}

impl DataType {
    /// The Go type expression with no nullability applied
    pub fn bare(&self) -> String {
        match self {
            DataType::Bool => "bool".to_string(),
            DataType::Int64 => "int64".to_string(),
            DataType::Float64 => "float64".to_string(),
            DataType::String => "string".to_string(),
            DataType::Bytes => "[]byte".to_string(),
            DataType::Array(inner) => format!("[]{}", inner.bare()),
            DataType::External(external) => external.to_string(),
        }
    }

    /// Sequences already have an empty value and never get a nullable form.
    ///
    /// True exactly when [`DataType::bare`] starts with `[]`.
    pub fn is_sequence(&self) -> bool {
        matches!(self, DataType::Bytes | DataType::Array(_))
    }

    /// The dedicated `database/sql` wrapper, for the four kinds that have one
    pub fn null_wrapper(&self) -> Option<&'static str> {
        match self {
            DataType::Bool => Some("sql.NullBool"),
            DataType::Int64 => Some("sql.NullInt64"),
            DataType::Float64 => Some("sql.NullFloat64"),
            DataType::String => Some("sql.NullString"),
            _ => None,
        }
    }

    /// Every external type this kind refers to
    fn externals(&self) -> Vec<&ExternalType> {
        match self {
            DataType::External(external) => vec![external],
            DataType::Array(inner) => inner.externals(),
            _ => Vec::new(),
        }
    }
}

/// How "this column may have no value" is spelled in generated types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypePolicy {
    /// Native type unchanged
    #[default]
    Bare,
    /// `sql.Null*` for primitives, `*T` for everything else
    Null,
    /// `*T` for everything
    Pointer,
}

/// Render the type expression for `data_type` under `policy`
///
/// Pure; use [`map_type`] while building metadata so imports are tracked.
pub fn render_type(data_type: &DataType, policy: TypePolicy) -> String {
    let bare = data_type.bare();
    if data_type.is_sequence() {
        return bare;
    }

    match policy {
        TypePolicy::Bare => bare,
        TypePolicy::Null => match data_type.null_wrapper() {
            Some(wrapper) => wrapper.to_string(),
            None => format!("*{}", bare),
        },
        TypePolicy::Pointer => format!("*{}", bare),
    }
}

/// Render the type expression and register the packages it needs
pub fn map_type(data_type: &DataType, policy: TypePolicy, imports: &mut BTreeSet<String>) -> String {
    for external in data_type.externals() {
        imports.insert(external.path.clone());
    }

    let rendered = render_type(data_type, policy);
    if rendered.starts_with("sql.") {
        imports.insert(SQL_PACKAGE.to_string());
    }
    rendered
}
