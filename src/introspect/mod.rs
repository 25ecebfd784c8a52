//! Schema sources.
//!
//! A [`SchemaSource`] produces [`RawMetadata`] for the graph builder. The
//! SQLite source reads the catalog of a live connection; the JSON source
//! reads a metadata file; `RawMetadata` is itself a source for tests and
//! embedding.

mod json;
mod sqlite;

pub use json::JsonSchemaFile;
pub use sqlite::SqliteSource;

use crate::schema::{RawMetadata, SchemaResult};

/// Something that can describe tables, columns and foreign keys.
pub trait SchemaSource {
    fn introspect(&self) -> SchemaResult<RawMetadata>;
}

impl SchemaSource for RawMetadata {
    fn introspect(&self) -> SchemaResult<RawMetadata> {
        Ok(self.clone())
    }
}
