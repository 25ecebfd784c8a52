//! SQLite catalog introspection.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::SchemaSource;
use crate::schema::{RawMetadata, RawTable, SchemaResult};

/// Reads tables, columns and foreign keys from a SQLite connection.
pub struct SqliteSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn table_names(&self) -> SchemaResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn table(&self, name: &str) -> SchemaResult<RawTable> {
        let mut table = RawTable::new(name);

        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (column, data_type) in columns {
            table = table.column(column, data_type);
        }

        let mut stmt = self.conn.prepare(
            "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )?;
        let foreign_keys = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (column, references_table, references_column) in foreign_keys {
            // `REFERENCES t` without a column targets t's primary key.
            let references_column = match references_column {
                Some(column) => Some(column),
                None => self.primary_key(&references_table)?,
            };
            match references_column {
                Some(references_column) => {
                    table = table.foreign_key(column, references_table, references_column);
                }
                None => {
                    warn!(
                        table = name,
                        column = %column,
                        references = %references_table,
                        "foreign key target has no primary key, skipping"
                    );
                }
            }
        }

        Ok(table)
    }

    fn primary_key(&self, table: &str) -> SchemaResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT name FROM pragma_table_info(?1) WHERE pk = 1",
                params![table],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl SchemaSource for SqliteSource<'_> {
    fn introspect(&self) -> SchemaResult<RawMetadata> {
        let tables = self
            .table_names()?
            .iter()
            .map(|name| self.table(name))
            .collect::<SchemaResult<Vec<_>>>()?;
        debug!(tables = tables.len(), "introspected sqlite schema");
        Ok(RawMetadata { tables })
    }
}
