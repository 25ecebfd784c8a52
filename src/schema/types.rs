//! Schema model types: raw introspected metadata and the typed tables the
//! graph is built from.

use serde::{Deserialize, Serialize};

use super::filter::DEFAULT_SCHEMA;

// ============================================================================
// Raw metadata
// ============================================================================

/// Metadata as produced by a schema source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

/// One introspected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<RawColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<RawForeignKey>,
}

impl RawTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(RawColumn {
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(RawForeignKey {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
        });
        self
    }

    /// The process-wide table name: `schema.name` for a non-default schema,
    /// otherwise the bare `name`.
    pub fn qualified_name(&self) -> String {
        qualify(self.schema.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
}

/// A foreign key declared on the owning table.
///
/// `references_table` is a qualified table name; a `public.` prefix is
/// accepted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

pub(crate) fn qualify(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) if schema != DEFAULT_SCHEMA => format!("{}.{}", schema, name),
        _ => name.to_string(),
    }
}

/// The graph key for a possibly schema-qualified name.
pub(crate) fn table_key(name: &str) -> &str {
    name.strip_prefix(DEFAULT_SCHEMA)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(name)
}

// ============================================================================
// Column types
// ============================================================================

/// The closed set of column types the builders reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// Map a database type name onto a column type.
    ///
    /// Exact names are matched first; anything else falls back to SQLite's
    /// affinity rules and finally to `Text`.
    pub fn from_raw(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let base = lowered.split('(').next().unwrap_or_default().trim();

        match base {
            "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" | "serial"
            | "bigserial" => return ColumnType::Integer,
            "float" | "double" | "double precision" | "real" | "decimal" | "numeric" => {
                return ColumnType::Float
            }
            "text" | "string" | "clob" => return ColumnType::Text,
            "date" | "datetime" | "time" => return ColumnType::Timestamp,
            "boolean" | "bool" => return ColumnType::Boolean,
            _ => {}
        }

        if base.starts_with("timestamp") || base.starts_with("time ") {
            ColumnType::Timestamp
        } else if base.starts_with("varchar")
            || base.starts_with("character")
            || base.starts_with("char")
        {
            ColumnType::Text
        } else if base.starts_with("interval") || base.starts_with("point") {
            ColumnType::Text
        } else if base.contains("int") {
            ColumnType::Integer
        } else if base.contains("char") || base.contains("clob") || base.contains("text") {
            ColumnType::Text
        } else if base.contains("real")
            || base.contains("floa")
            || base.contains("doub")
            || base.contains("num")
        {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Validated model
// ============================================================================

/// A column of a table in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    /// Qualified name of the owning table.
    pub table: String,
}

/// A table node in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Qualified name, unique within a graph.
    pub name: String,
    pub schema: Option<String>,
    /// Unqualified relation name, as written in SQL.
    pub relation: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One oriented half of a foreign-key relation.
///
/// `table`/`column` is always the local side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyEdge {
    pub table: String,
    pub column: String,
    pub other_table: String,
    pub other_column: String,
}

impl ForeignKeyEdge {
    pub fn reversed(&self) -> Self {
        Self {
            table: self.other_table.clone(),
            column: self.other_column.clone(),
            other_table: self.table.clone(),
            other_column: self.column.clone(),
        }
    }
}
