//! Crate-level error type with stable kind tags.
//!
//! Every failure surfaced to callers is a [`QueryError`]. Its [`ErrorKind`]
//! is the stable, machine-readable tag used in [`ErrorReport`] output.

use serde::Serialize;

use crate::executor::ExecutionError;
use crate::schema::SchemaError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while resolving, building or executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Table '{table}' is not reachable from the other requested tables")]
    UnreachableTable { table: String },

    #[error("Invalid constraint on '{column}' with operator '{operator}': {reason}")]
    InvalidConstraint {
        column: String,
        operator: String,
        reason: String,
    },

    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Refusing to UPDATE '{table}' without constraints")]
    UnscopedUpdate { table: String },

    #[error("Statement already built")]
    AlreadyBuilt,

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Stable category of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    UnreachableTable,
    InvalidConstraint,
    InvalidAggregation,
    UnscopedUpdate,
    AlreadyBuilt,
    SchemaError,
    ExecutionError,
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnreachableTable => "UnreachableTable",
            ErrorKind::InvalidConstraint => "InvalidConstraint",
            ErrorKind::InvalidAggregation => "InvalidAggregation",
            ErrorKind::UnscopedUpdate => "UnscopedUpdate",
            ErrorKind::AlreadyBuilt => "AlreadyBuilt",
            ErrorKind::SchemaError => "SchemaError",
            ErrorKind::ExecutionError => "ExecutionError",
            ErrorKind::InvalidRequest => "InvalidRequest",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::UnreachableTable { .. } => ErrorKind::UnreachableTable,
            QueryError::InvalidConstraint { .. } => ErrorKind::InvalidConstraint,
            QueryError::InvalidAggregation(_) => ErrorKind::InvalidAggregation,
            QueryError::UnscopedUpdate { .. } => ErrorKind::UnscopedUpdate,
            QueryError::AlreadyBuilt => ErrorKind::AlreadyBuilt,
            QueryError::Schema(_) => ErrorKind::SchemaError,
            QueryError::Execution(_) => ErrorKind::ExecutionError,
            QueryError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    pub(crate) fn invalid_constraint(
        column: &str,
        operator: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidConstraint {
            column: column.to_string(),
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}

/// Structured error output: `{"kind": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&QueryError> for ErrorReport {
    fn from(err: &QueryError) -> Self {
        ErrorReport {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
