//! # dbtogo
//!
//! Generate Go data access code from database schemas
//!
//! This crate provides a CLI tool and library for reading table and column
//! metadata from a live database and rendering it into Go struct
//! declarations and SQL statement text, either through a template or as a
//! fixed document.

pub mod codegen;
pub mod config;
pub mod error;
pub mod inflect;
pub mod introspect;
pub mod metadata;
pub mod naming;
pub mod schema;
pub mod types;

pub mod prelude {
    pub use crate::codegen::{
        CodeGenConfig, CodeGenerator, GoGenerator, OutputMode, OutputTarget, TemplateRenderer,
        TemplateSource,
    };
    pub use crate::config::DsnConfig;
    pub use crate::error::DbtogoError;
    pub use crate::inflect::Inflections;
    pub use crate::introspect::{Introspector, TableFilter};
    pub use crate::metadata::{Metadata, MetadataOptions, Placeholder};
    pub use crate::naming::NamingOptions;
    pub use crate::schema::{Field, Struct};
    pub use crate::types::{DataType, ExternalType, TypePolicy};
}

#[cfg(feature = "postgres")]
pub use introspect::PostgresIntrospector;

#[cfg(feature = "sqlite")]
pub use introspect::SqliteIntrospector;
