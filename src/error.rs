use thiserror::Error;

/// dbtogo errors
#[derive(Error, Debug)]
pub enum DbtogoError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to introspect {backend} schema: {message}")]
    Introspection { backend: String, message: String },

    #[error("Empty identifier in table '{table}'")]
    EmptyIdentifier { table: String },

    #[error("'{name}' in table '{table}' sanitizes to '{clean}', which is not a valid identifier")]
    InvalidIdentifier {
        table: String,
        name: String,
        clean: String,
    },

    #[error("'{first}' and '{second}' in '{scope}' both sanitize to '{clean}'")]
    NameCollision {
        scope: String,
        first: String,
        second: String,
        clean: String,
    },

    #[error("Template '{name}' failed: {message}")]
    Template { name: String, message: String },

    #[error("Formatter failed: {0}")]
    Format(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
