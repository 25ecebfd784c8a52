//! Statement assembly.
//!
//! Requests flow through the typed stages in [`stage`]:
//!
//! ```text
//! QueryRequest ──► QueryBuilder ──┐
//!                                 ├──► BuiltStatement { sql, params }
//! UpdateRequest ─► UpdateBuilder ─┘
//! ```
//!
//! Joins come from [`crate::planner::JoinResolver`], predicates from
//! [`ConstraintFormatter`]. User values only ever travel as bound
//! parameters.

pub mod constraint;
mod pipeline;
mod request;
mod select;
pub mod stage;
mod statement;
mod update;

pub use constraint::{ConstraintFormatter, Operator, UnknownOperator};
pub use pipeline::{SelectPipeline, UpdatePipeline};
pub use request::{
    Aggregate, Assignment, ColumnSpec, ConstraintSpec, QueryRequest, SortDirection,
    UpdateConstraint, UpdateRequest,
};
pub use select::{build_select, QueryBuilder};
pub use stage::Stage;
pub use statement::BuiltStatement;
pub use update::{build_update, UpdateBuilder};
