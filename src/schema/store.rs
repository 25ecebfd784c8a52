//! Versioned holder for the current schema snapshot.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::info;

use super::error::SchemaResult;
use super::graph::SchemaGraph;
use super::types::RawTable;

#[derive(Debug)]
struct Current {
    graph: Arc<SchemaGraph>,
    version: u64,
}

/// Holds the current [`SchemaGraph`] behind an atomically swapped `Arc`.
///
/// Readers clone the pointer and keep it for as long as they need; the lock
/// is only held for the clone or the swap.
#[derive(Debug)]
pub struct SchemaStore {
    current: RwLock<Current>,
}

impl SchemaStore {
    pub fn new(graph: SchemaGraph) -> Self {
        Self {
            current: RwLock::new(Current {
                graph: Arc::new(graph),
                version: 1,
            }),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<SchemaGraph> {
        Arc::clone(&self.current.read().graph)
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Swap in a new snapshot and return its version.
    pub fn replace(&self, graph: SchemaGraph) -> u64 {
        let mut current = self.current.write();
        current.graph = Arc::new(graph);
        current.version += 1;
        info!(version = current.version, "schema snapshot replaced");
        current.version
    }

    /// Build a snapshot from the current one plus `table`, then swap it in.
    ///
    /// Concurrent `extend` calls are serialized; readers are not blocked
    /// while the new graph is built.
    pub fn extend(&self, table: RawTable) -> SchemaResult<u64> {
        let current = self.current.upgradable_read();
        let name = table.qualified_name();
        let graph = current.graph.with_table(table)?;

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        current.graph = Arc::new(graph);
        current.version += 1;
        info!(version = current.version, table = %name, "schema snapshot extended");
        Ok(current.version)
    }

    /// Build a snapshot from the current one without `table`, then swap it in.
    pub fn remove(&self, table: &str) -> SchemaResult<u64> {
        let current = self.current.upgradable_read();
        let graph = current.graph.without_table(table)?;

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        current.graph = Arc::new(graph);
        current.version += 1;
        info!(version = current.version, table, "schema snapshot reduced");
        Ok(current.version)
    }
}
