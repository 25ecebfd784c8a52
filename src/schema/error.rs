/// Errors raised while building or querying a schema graph, or while
/// introspecting metadata for one.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema metadata contains no tables")]
    EmptyMetadata,

    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    #[error("Duplicate column: {table}.{column}")]
    DuplicateColumn { table: String, column: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Introspection failed: {0}")]
    Introspection(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schema file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
