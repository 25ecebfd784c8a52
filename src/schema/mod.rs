//! Schema metadata and the foreign-key relationship graph.
//!
//! Raw metadata from a [`crate::introspect::SchemaSource`] passes through a
//! [`MetadataFilter`], is validated into a [`SchemaGraph`], and is published
//! through a [`SchemaStore`] as immutable, versioned snapshots.

mod error;
mod filter;
mod graph;
mod store;
mod types;

pub use error::{SchemaError, SchemaResult};
pub use filter::{MetadataFilter, DEFAULT_SCHEMA};
pub use graph::SchemaGraph;
pub use store::SchemaStore;
pub use types::{
    Column, ColumnType, ForeignKeyEdge, RawColumn, RawForeignKey, RawMetadata, RawTable, Table,
};
