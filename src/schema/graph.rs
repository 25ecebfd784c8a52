//! The relationship graph over tables and foreign keys.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::error::{SchemaError, SchemaResult};
use super::types::{
    table_key, Column, ColumnType, ForeignKeyEdge, RawMetadata, RawTable, Table,
};

/// An immutable snapshot of tables and their foreign-key relations.
///
/// Nodes are tables. Every foreign key contributes two directed edges, one
/// per orientation, so traversal from either endpoint sees the relation with
/// itself as the local side.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    /// The underlying directed graph
    graph: DiGraph<Table, ForeignKeyEdge>,

    /// Index: qualified table name → NodeIndex
    table_index: HashMap<String, NodeIndex>,

    /// Metadata this snapshot was built from
    source: RawMetadata,
}

impl SchemaGraph {
    /// Validate raw metadata and build a graph from it.
    pub fn build(raw: &RawMetadata) -> SchemaResult<Self> {
        if raw.tables.is_empty() {
            return Err(SchemaError::EmptyMetadata);
        }

        let mut graph = DiGraph::new();
        let mut table_index = HashMap::new();

        // Phase 1: table nodes
        for raw_table in &raw.tables {
            let name = raw_table.qualified_name();
            if table_index.contains_key(&name) {
                return Err(SchemaError::DuplicateTable(name));
            }

            let mut columns: Vec<Column> = Vec::with_capacity(raw_table.columns.len());
            for raw_column in &raw_table.columns {
                if columns.iter().any(|c| c.name == raw_column.name) {
                    return Err(SchemaError::DuplicateColumn {
                        table: name,
                        column: raw_column.name.clone(),
                    });
                }
                columns.push(Column {
                    name: raw_column.name.clone(),
                    column_type: ColumnType::from_raw(&raw_column.data_type),
                    table: name.clone(),
                });
            }

            let idx = graph.add_node(Table {
                name: name.clone(),
                schema: raw_table.schema.clone(),
                relation: raw_table.name.clone(),
                columns,
            });
            table_index.insert(name, idx);
        }

        // Phase 2: foreign-key edges
        let mut seen: HashSet<ForeignKeyEdge> = HashSet::new();
        for raw_table in &raw.tables {
            let name = raw_table.qualified_name();
            let local = *table_index
                .get(&name)
                .ok_or_else(|| SchemaError::UnknownTable(name.clone()))?;

            for fk in &raw_table.foreign_keys {
                if graph[local].column(&fk.column).is_none() {
                    return Err(SchemaError::UnknownColumn {
                        table: name.clone(),
                        column: fk.column.clone(),
                    });
                }
                let remote_name = table_key(&fk.references_table);
                let remote = *table_index
                    .get(remote_name)
                    .ok_or_else(|| SchemaError::UnknownTable(remote_name.to_string()))?;
                if graph[remote].column(&fk.references_column).is_none() {
                    return Err(SchemaError::UnknownColumn {
                        table: remote_name.to_string(),
                        column: fk.references_column.clone(),
                    });
                }

                if local == remote {
                    debug!(table = %name, column = %fk.column, "skipping self-referencing foreign key");
                    continue;
                }

                let edge = ForeignKeyEdge {
                    table: name.clone(),
                    column: fk.column.clone(),
                    other_table: remote_name.to_string(),
                    other_column: fk.references_column.clone(),
                };
                if !seen.insert(edge.clone()) {
                    continue;
                }
                let reverse = edge.reversed();
                seen.insert(reverse.clone());

                graph.add_edge(local, remote, edge);
                graph.add_edge(remote, local, reverse);
            }
        }

        debug!(
            tables = graph.node_count(),
            relations = graph.edge_count() / 2,
            "built schema graph"
        );

        Ok(Self {
            graph,
            table_index,
            source: raw.clone(),
        })
    }

    /// A new snapshot with one more table. The receiver is left untouched.
    pub fn with_table(&self, table: RawTable) -> SchemaResult<Self> {
        let mut raw = self.source.clone();
        raw.tables.push(table);
        Self::build(&raw)
    }

    /// A new snapshot without `table` or any foreign key that references it.
    pub fn without_table(&self, table: &str) -> SchemaResult<Self> {
        if !self.contains(table) {
            return Err(SchemaError::UnknownTable(table.to_string()));
        }

        let mut raw = self.source.clone();
        raw.tables.retain(|t| t.qualified_name() != table);
        for remaining in &mut raw.tables {
            remaining
                .foreign_keys
                .retain(|fk| table_key(&fk.references_table) != table);
        }
        Self::build(&raw)
    }

    /// The metadata this snapshot was built from.
    pub fn to_raw(&self) -> RawMetadata {
        self.source.clone()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.table_index.contains_key(table)
    }

    pub fn table(&self, table: &str) -> SchemaResult<&Table> {
        self.table_index
            .get(table)
            .map(|idx| &self.graph[*idx])
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))
    }

    pub fn columns(&self, table: &str) -> SchemaResult<&[Column]> {
        self.table(table).map(|t| t.columns.as_slice())
    }

    pub fn column(&self, table: &str, column: &str) -> SchemaResult<&Column> {
        self.table(table)?
            .column(column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// All qualified table names, sorted.
    pub fn tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table_index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of distinct foreign-key relations.
    pub fn relation_count(&self) -> usize {
        self.graph.edge_count() / 2
    }

    /// Edges incident to `table`, with `table` as the local side.
    ///
    /// Sorted by (neighbor table, local column, neighbor column) so traversal
    /// order never depends on insertion order. Unknown and isolated tables
    /// have no neighbors.
    pub fn neighbors(&self, table: &str) -> Vec<ForeignKeyEdge> {
        let Some(idx) = self.table_index.get(table) else {
            return Vec::new();
        };

        let mut edges: Vec<ForeignKeyEdge> = self
            .graph
            .edges(*idx)
            .map(|edge| edge.weight().clone())
            .collect();
        edges.sort_by(|a, b| {
            (&a.other_table, &a.column, &a.other_column).cmp(&(
                &b.other_table,
                &b.column,
                &b.other_column,
            ))
        });
        edges
    }
}
