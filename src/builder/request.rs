//! Declarative request shapes, deserialized from JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::sql::Value;

static ALIAS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A read request: which columns to select, filter, group, sort and page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    /// Tables to include even if no column references them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
    pub columns: Vec<ColumnSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintSpec>,
    #[serde(default)]
    pub group_by: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
}

impl ColumnSpec {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn filter(mut self, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraint = Some(ConstraintSpec {
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    pub fn group_by(mut self) -> Self {
        self.group_by = true;
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn sort(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }
}

/// A filter on one column: operator text plus the raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregate {
    #[serde(alias = "sum")]
    Sum,
    #[serde(alias = "count")]
    Count,
    #[serde(alias = "avg")]
    Avg,
    #[serde(alias = "min")]
    Min,
    #[serde(alias = "max")]
    Max,
}

impl Aggregate {
    pub fn function_name(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Count => "COUNT",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.function_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Asc,
    #[serde(alias = "desc")]
    Desc,
}

impl QueryRequest {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> QueryResult<()> {
        if self.columns.is_empty() {
            return Err(QueryError::InvalidRequest(
                "request selects no columns".into(),
            ));
        }
        if self.tables.iter().any(|t| t.is_empty()) {
            return Err(QueryError::InvalidRequest("empty table name".into()));
        }
        for spec in &self.columns {
            if spec.table.is_empty() || spec.column.is_empty() {
                return Err(QueryError::InvalidRequest(
                    "column spec needs a table and a column".into(),
                ));
            }
            if let Some(alias) = &spec.alias {
                validate_alias(alias)?;
            }
        }
        Ok(())
    }

    /// Distinct tables, explicit ones first, then in column order.
    pub(crate) fn referenced_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        let names = self
            .tables
            .iter()
            .chain(self.columns.iter().map(|c| &c.table));
        for name in names {
            if !tables.contains(name) {
                tables.push(name.clone());
            }
        }
        tables
    }
}

pub(crate) fn validate_alias(alias: &str) -> QueryResult<()> {
    if ALIAS_PATTERN.is_match(alias) {
        Ok(())
    } else {
        Err(QueryError::InvalidRequest(format!(
            "alias '{}' must match {}",
            alias,
            ALIAS_PATTERN.as_str()
        )))
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// A write request against a single table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub constraints: Vec<UpdateConstraint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConstraint {
    /// Must name the target table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
    pub operator: String,
    pub value: Value,
}

impl UpdateRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.constraints.push(UpdateConstraint {
            table: None,
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    /// Checked in this order so an unscoped write is always reported as such.
    pub(crate) fn validate(&self) -> QueryResult<()> {
        if self.table.is_empty() {
            return Err(QueryError::InvalidRequest("empty table name".into()));
        }
        if self.constraints.is_empty() {
            return Err(QueryError::UnscopedUpdate {
                table: self.table.clone(),
            });
        }
        if self.assignments.is_empty() {
            return Err(QueryError::InvalidRequest(
                "update assigns no columns".into(),
            ));
        }
        for constraint in &self.constraints {
            if let Some(table) = &constraint.table {
                if *table != self.table {
                    return Err(QueryError::InvalidRequest(format!(
                        "update constraint references '{}', not the target table '{}'",
                        table, self.table
                    )));
                }
            }
        }
        Ok(())
    }
}
