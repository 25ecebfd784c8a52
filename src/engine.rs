//! End-to-end facade: request → statement → executor → result set.
//!
//! ```text
//! SchemaSource → MetadataFilter → SchemaGraph → SchemaStore
//!                                                   │ snapshot
//!                       QueryRequest / UpdateRequest ▼
//!                              builders → BuiltStatement → Executor → ResultSet
//! ```
//!
//! # Example
//!
//! ```ignore
//! use autojoin::builder::{ColumnSpec, QueryRequest};
//! use autojoin::engine::Engine;
//! use autojoin::executor::SqliteExecutor;
//! use autojoin::introspect::SqliteSource;
//!
//! let executor = SqliteExecutor::open("app.db")?;
//! let raw = SqliteSource::new(executor.connection()).introspect()?;
//! let engine = Engine::from_metadata(raw, executor, Settings::default())?;
//!
//! let rows = engine.run_query(QueryRequest::new(vec![
//!     ColumnSpec::new("customers", "name"),
//!     ColumnSpec::new("orders", "total"),
//! ]))?;
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::builder::{
    build_select, build_update, Aggregate, BuiltStatement, ColumnSpec, QueryBuilder,
    QueryRequest, UpdateRequest,
};
use crate::config::Settings;
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, ResultSet};
use crate::introspect::SchemaSource;
use crate::schema::{
    ColumnType, MetadataFilter, RawMetadata, RawTable, SchemaGraph, SchemaStore,
};
use crate::sql::dml::{CreateTableAs, DropTable};
use crate::sql::Dialect;

static DERIVED_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Owns the schema store, the executor and the settings.
#[derive(Debug)]
pub struct Engine<E> {
    store: SchemaStore,
    executor: E,
    settings: Settings,
}

impl<E: Executor> Engine<E> {
    pub fn new(graph: SchemaGraph, executor: E, settings: Settings) -> Self {
        Self {
            store: SchemaStore::new(graph),
            executor,
            settings,
        }
    }

    /// Filter metadata per settings and build the initial snapshot.
    pub fn from_metadata(raw: RawMetadata, executor: E, settings: Settings) -> QueryResult<Self> {
        let raw = MetadataFilter::from(&settings.schema).apply(raw);
        let graph = SchemaGraph::build(&raw)?;
        info!(
            tables = graph.tables().len(),
            relations = graph.relation_count(),
            dialect = %settings.dialect,
            "engine ready"
        );
        Ok(Self::new(graph, executor, settings))
    }

    pub fn from_source(
        source: &dyn SchemaSource,
        executor: E,
        settings: Settings,
    ) -> QueryResult<Self> {
        Self::from_metadata(source.introspect()?, executor, settings)
    }

    pub fn dialect(&self) -> Dialect {
        self.settings.dialect
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Build a SELECT against the current snapshot, applying the configured
    /// default limit when the request sets none.
    pub fn build_query(&self, mut request: QueryRequest) -> QueryResult<BuiltStatement> {
        if request.limit.is_none() {
            request.limit = self.settings.query.default_limit;
        }
        let graph = self.store.snapshot();
        build_select(&graph, self.dialect(), request)
    }

    pub fn build_update(&self, request: UpdateRequest) -> QueryResult<BuiltStatement> {
        let graph = self.store.snapshot();
        build_update(&graph, self.dialect(), request)
    }

    pub fn run_query(&self, request: QueryRequest) -> QueryResult<ResultSet> {
        let statement = self.build_query(request)?;
        self.execute(&statement)
    }

    /// Run an UPDATE and return the number of rows it changed.
    pub fn run_update(&self, request: UpdateRequest) -> QueryResult<usize> {
        let statement = self.build_update(request)?;
        Ok(self.execute(&statement)?.rows_affected)
    }

    pub fn execute(&self, statement: &BuiltStatement) -> QueryResult<ResultSet> {
        debug!(sql = %statement.sql, params = statement.params.len(), "executing");
        Ok(self.executor.execute(&statement.sql, &statement.params)?)
    }

    /// Materialize `request` as `{prefix}{owner}_{name}` and register it as a
    /// joinable table.
    ///
    /// Columns are named by alias, or by the source column (prefixed with the
    /// aggregate function when aggregated). Non-aggregated columns keep the
    /// foreign keys of their source column. Returns the new table's name.
    pub fn save_derived_table(
        &self,
        owner: &str,
        name: &str,
        mut request: QueryRequest,
    ) -> QueryResult<String> {
        let table_name = self.derived_name(owner, name)?;

        let graph = self.store.snapshot();
        if graph.contains(&table_name) {
            return Err(QueryError::InvalidRequest(format!(
                "table '{}' already exists",
                table_name
            )));
        }

        let mut names: Vec<String> = Vec::with_capacity(request.columns.len());
        for spec in &mut request.columns {
            let column_name = spec
                .alias
                .clone()
                .unwrap_or_else(|| derived_column_name(spec));
            // SQLite column names are case-insensitive
            if names.iter().any(|n| n.eq_ignore_ascii_case(&column_name)) {
                return Err(QueryError::InvalidRequest(format!(
                    "duplicate column '{}' in derived table",
                    column_name
                )));
            }
            spec.alias = Some(column_name.clone());
            names.push(column_name);
        }

        let (query, params) = QueryBuilder::new(&graph, self.dialect(), request.clone())
            .resolve_tables()?
            .resolve_joins()?
            .format_constraints()?
            .assemble_clauses()?
            .into_parts();

        let derived = derived_table(&graph, &table_name, &request)?;

        let create = CreateTableAs::new(table_name.as_str(), query);
        let statement = BuiltStatement {
            sql: create.to_sql(self.dialect()),
            params,
        };
        self.execute(&statement)?;

        let version = self.store.extend(derived)?;
        info!(table = %table_name, version, "derived table registered");
        Ok(table_name)
    }

    /// Drop a table saved by [`Engine::save_derived_table`] and publish a
    /// snapshot without it. Returns the dropped table's name.
    pub fn drop_derived_table(&self, owner: &str, name: &str) -> QueryResult<String> {
        let table_name = self.derived_name(owner, name)?;
        // Fails with UnknownTable before anything is executed
        self.store.snapshot().table(&table_name)?;

        let statement = BuiltStatement {
            sql: DropTable::new(table_name.as_str()).to_sql(self.dialect()),
            params: Vec::new(),
        };
        self.execute(&statement)?;

        let version = self.store.remove(&table_name)?;
        info!(table = %table_name, version, "derived table dropped");
        Ok(table_name)
    }

    /// Names of the derived tables `owner` has saved, sorted.
    pub fn derived_tables(&self, owner: &str) -> Vec<String> {
        let prefix = format!("{}{}_", self.settings.schema.derived_prefix, owner);
        let graph = self.store.snapshot();
        graph
            .tables()
            .into_iter()
            .filter(|table| table.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    fn derived_name(&self, owner: &str, name: &str) -> QueryResult<String> {
        for part in [owner, name] {
            if !DERIVED_NAME_PATTERN.is_match(part) {
                return Err(QueryError::InvalidRequest(format!(
                    "derived table name part '{}' must match {}",
                    part,
                    DERIVED_NAME_PATTERN.as_str()
                )));
            }
        }
        Ok(format!("{}{}_{}", self.settings.schema.derived_prefix, owner, name))
    }
}

fn derived_column_name(spec: &ColumnSpec) -> String {
    match spec.aggregate {
        Some(aggregate) => format!(
            "{}_{}",
            aggregate.function_name().to_ascii_lowercase(),
            spec.column
        ),
        None => spec.column.clone(),
    }
}

/// Metadata for a derived table; every column spec must carry its alias.
fn derived_table(
    graph: &SchemaGraph,
    table_name: &str,
    request: &QueryRequest,
) -> QueryResult<RawTable> {
    let mut table = RawTable::new(table_name);

    for spec in &request.columns {
        let source = graph.column(&spec.table, &spec.column)?;
        let name = spec
            .alias
            .clone()
            .unwrap_or_else(|| derived_column_name(spec));

        let column_type = match spec.aggregate {
            Some(Aggregate::Count) => ColumnType::Integer,
            Some(Aggregate::Avg) => ColumnType::Float,
            _ => source.column_type,
        };
        table = table.column(name.as_str(), column_type.as_str());

        if spec.aggregate.is_none() {
            for edge in graph.neighbors(&spec.table) {
                if edge.column == spec.column {
                    table = table.foreign_key(name.as_str(), edge.other_table, edge.other_column);
                }
            }
        }
    }

    Ok(table)
}
