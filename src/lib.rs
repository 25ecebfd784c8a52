//! # Autojoin
//!
//! Builds SQL from column selections by discovering the joins between the
//! requested tables through their foreign keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          SchemaSource (SQLite catalog, JSON file)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [MetadataFilter]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SchemaGraph (tables + foreign key edges)          │
//! │        held by SchemaStore as versioned snapshots        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [JoinResolver, ConstraintFormatter]
//! ┌─────────────────────────────────────────────────────────┐
//! │       QueryBuilder / UpdateBuilder (typed stages)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │          BuiltStatement (SQL + bound parameters)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Executor]
//!                      ResultSet
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod planner;
pub mod schema;
pub mod sql;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::dml;
pub use sql::expr;
pub use sql::query;
pub use sql::token;
pub use sql::value;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::builder::{
        build_select, build_update, Aggregate, BuiltStatement, ColumnSpec, QueryBuilder,
        QueryRequest, SortDirection, UpdateBuilder, UpdateRequest,
    };
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::engine::Engine;
    pub use crate::error::{ErrorKind, ErrorReport, QueryError, QueryResult};
    pub use crate::executor::{Executor, ResultSet, SqliteExecutor};
    pub use crate::introspect::{JsonSchemaFile, SchemaSource, SqliteSource};
    pub use crate::planner::{JoinPlan, JoinResolver};
    pub use crate::schema::{RawMetadata, RawTable, SchemaGraph, SchemaStore};
    pub use crate::value::Value;
}

// Also export at crate root for convenience
pub use builder::{BuiltStatement, ColumnSpec, QueryRequest, UpdateRequest};
pub use dialect::Dialect;
pub use engine::Engine;
pub use error::{QueryError, QueryResult};
pub use schema::SchemaGraph;
pub use value::Value;
