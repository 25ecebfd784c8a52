use std::fs;
use std::path::{Path, PathBuf};

use super::SchemaSource;
use crate::schema::{RawMetadata, SchemaResult};

/// Metadata stored as a JSON file in the [`RawMetadata`] shape.
#[derive(Debug, Clone)]
pub struct JsonSchemaFile {
    path: PathBuf,
}

impl JsonSchemaFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchemaSource for JsonSchemaFile {
    fn introspect(&self) -> SchemaResult<RawMetadata> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
