//! Statement execution.
//!
//! The builders never touch a database. An [`Executor`] takes the SQL text
//! and bound parameters of a [`crate::builder::BuiltStatement`] and returns a
//! [`ResultSet`]; errors are passed through without retry.

mod sqlite;

pub use sqlite::SqliteExecutor;

use serde::Serialize;

use crate::sql::Value;

/// Errors raised by an executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Database(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Rows returned by a statement, or the number of rows it changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: usize,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A connection able to run one parameterized statement.
pub trait Executor {
    fn execute(&self, sql: &str, params: &[Value]) -> ExecutionResult<ResultSet>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, sql: &str, params: &[Value]) -> ExecutionResult<ResultSet> {
        (**self).execute(sql, params)
    }
}
