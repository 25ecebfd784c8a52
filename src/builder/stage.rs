//! Assembly stages shared by the SELECT and UPDATE builders.
//!
//! Each stage is its own type and every transition consumes the builder, so
//! stages can only be visited in order:
//!
//! ```text
//! Empty → TablesResolved → JoinsResolved → ConstraintsFormatted → ClausesAssembled → Built
//! ```

use crate::planner::JoinPlan;
use crate::sql::{Expr, Value};

/// Nothing resolved yet.
#[derive(Debug, Clone, Default)]
pub struct Empty;

/// Every referenced table and column exists in the snapshot.
#[derive(Debug, Clone)]
pub struct TablesResolved {
    pub(crate) tables: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JoinsResolved {
    pub(crate) plan: JoinPlan,
}

/// Predicates rendered; `params` holds every bound value in SQL text order.
#[derive(Debug, Clone)]
pub struct ConstraintsFormatted {
    pub(crate) plan: JoinPlan,
    pub(crate) predicates: Vec<Expr>,
    pub(crate) params: Vec<Value>,
}

/// The statement AST is complete.
#[derive(Debug, Clone)]
pub struct ClausesAssembled<T> {
    pub(crate) statement: T,
    pub(crate) params: Vec<Value>,
}

/// Stage names, for logging and for the runtime pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Empty,
    TablesResolved,
    JoinsResolved,
    ConstraintsFormatted,
    ClausesAssembled,
    Built,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Empty => "empty",
            Stage::TablesResolved => "tables_resolved",
            Stage::JoinsResolved => "joins_resolved",
            Stage::ConstraintsFormatted => "constraints_formatted",
            Stage::ClausesAssembled => "clauses_assembled",
            Stage::Built => "built",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
