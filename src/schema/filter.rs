//! Pre-build filtering of introspected metadata.

use std::collections::HashSet;

use tracing::debug;

use super::types::{table_key, RawMetadata};
use crate::config::SchemaSettings;

/// Schema assumed for tables introspected without one.
pub const DEFAULT_SCHEMA: &str = "public";

/// Decides which introspected tables become graph nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    pub allowed_schemas: Vec<String>,
    pub blocked_tables: Vec<String>,
    pub derived_prefix: String,
    pub include_derived: bool,
}

impl Default for MetadataFilter {
    fn default() -> Self {
        Self {
            allowed_schemas: Vec::new(),
            blocked_tables: Vec::new(),
            derived_prefix: "u_".to_string(),
            include_derived: false,
        }
    }
}

impl From<&SchemaSettings> for MetadataFilter {
    fn from(settings: &SchemaSettings) -> Self {
        Self {
            allowed_schemas: settings.allowed_schemas.clone(),
            blocked_tables: settings.blocked_tables.clone(),
            derived_prefix: settings.derived_prefix.clone(),
            include_derived: settings.include_derived,
        }
    }
}

impl MetadataFilter {
    /// Drop filtered tables, then any foreign key that points at one.
    pub fn apply(&self, raw: RawMetadata) -> RawMetadata {
        let mut tables: Vec<_> = raw
            .tables
            .into_iter()
            .filter(|table| {
                let qualified = table.qualified_name();

                if !self.include_derived
                    && !self.derived_prefix.is_empty()
                    && table.name.starts_with(&self.derived_prefix)
                {
                    debug!(table = %qualified, "skipping derived table");
                    return false;
                }

                if self
                    .blocked_tables
                    .iter()
                    .any(|b| *b == table.name || *b == qualified)
                {
                    debug!(table = %qualified, "skipping blocked table");
                    return false;
                }

                let schema = table.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
                if !self.allowed_schemas.is_empty()
                    && !self.allowed_schemas.iter().any(|s| s == schema)
                {
                    debug!(table = %qualified, schema, "skipping table outside allowed schemas");
                    return false;
                }

                true
            })
            .collect();

        let kept: HashSet<String> = tables.iter().map(|t| t.qualified_name()).collect();
        for table in &mut tables {
            table.foreign_keys.retain(|fk| {
                let keep = kept.contains(table_key(&fk.references_table));
                if !keep {
                    debug!(
                        table = %table.name,
                        column = %fk.column,
                        references = %fk.references_table,
                        "dropping foreign key to filtered table"
                    );
                }
                keep
            });
        }

        RawMetadata { tables }
    }
}
