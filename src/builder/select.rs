//! SELECT assembly.

use tracing::debug;

use super::constraint::ConstraintFormatter;
use super::request::{Aggregate, ColumnSpec, QueryRequest, SortDirection};
use super::stage::{
    ClausesAssembled, ConstraintsFormatted, Empty, JoinsResolved, Stage, TablesResolved,
};
use super::statement::BuiltStatement;
use crate::error::{QueryError, QueryResult};
use crate::planner::{JoinPlan, JoinResolver};
use crate::schema::{ColumnType, SchemaGraph};
use crate::sql::expr::{func, schema_col, Expr, ExprExt};
use crate::sql::query::{OrderByExpr, Query, SelectExpr, TableRef};
use crate::sql::{Dialect, Value};

/// Builds a parameterized SELECT from a [`QueryRequest`].
///
/// ```ignore
/// let statement = QueryBuilder::new(&graph, Dialect::Sqlite, request)
///     .resolve_tables()?
///     .resolve_joins()?
///     .format_constraints()?
///     .assemble_clauses()?
///     .build();
/// ```
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until built"]
pub struct QueryBuilder<'g, S> {
    graph: &'g SchemaGraph,
    dialect: Dialect,
    request: QueryRequest,
    stage: S,
}

impl<'g, S> QueryBuilder<'g, S> {
    fn advance<N>(self, stage: N, name: Stage) -> QueryBuilder<'g, N> {
        debug!(stage = %name, "select builder advanced");
        QueryBuilder {
            graph: self.graph,
            dialect: self.dialect,
            request: self.request,
            stage,
        }
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }
}

impl<'g> QueryBuilder<'g, Empty> {
    pub fn new(graph: &'g SchemaGraph, dialect: Dialect, request: QueryRequest) -> Self {
        Self {
            graph,
            dialect,
            request,
            stage: Empty,
        }
    }

    /// Validate the request shape and check every table and column exists.
    pub fn resolve_tables(self) -> QueryResult<QueryBuilder<'g, TablesResolved>> {
        self.request.validate()?;

        let tables = self.request.referenced_tables();
        for table in &tables {
            self.graph.table(table)?;
        }
        for spec in &self.request.columns {
            self.graph.column(&spec.table, &spec.column)?;
        }

        Ok(self.advance(TablesResolved { tables }, Stage::TablesResolved))
    }
}

impl<'g> QueryBuilder<'g, TablesResolved> {
    pub fn resolve_joins(self) -> QueryResult<QueryBuilder<'g, JoinsResolved>> {
        let plan = JoinResolver::new(self.graph).resolve(&self.stage.tables)?;
        Ok(self.advance(JoinsResolved { plan }, Stage::JoinsResolved))
    }
}

impl<'g> QueryBuilder<'g, JoinsResolved> {
    pub fn plan(&self) -> &JoinPlan {
        &self.stage.plan
    }

    /// Render every column constraint, in request order.
    pub fn format_constraints(self) -> QueryResult<QueryBuilder<'g, ConstraintsFormatted>> {
        let mut formatter = ConstraintFormatter::new();
        let mut predicates = Vec::new();

        for spec in &self.request.columns {
            let Some(constraint) = &spec.constraint else {
                continue;
            };
            let column = self.graph.column(&spec.table, &spec.column)?;
            let target = column_expr(self.graph, &spec.table, &spec.column)?;
            predicates.push(formatter.format(
                column,
                target,
                &constraint.operator,
                &constraint.value,
            )?);
        }

        let stage = ConstraintsFormatted {
            plan: self.stage.plan.clone(),
            predicates,
            params: formatter.into_params(),
        };
        Ok(self.advance(stage, Stage::ConstraintsFormatted))
    }
}

impl<'g> QueryBuilder<'g, ConstraintsFormatted> {
    /// Check aggregation rules, then lay out SELECT through LIMIT/OFFSET.
    pub fn assemble_clauses(self) -> QueryResult<QueryBuilder<'g, ClausesAssembled<Query>>> {
        self.check_aggregation()?;

        let ConstraintsFormatted {
            plan,
            predicates,
            params,
        } = &self.stage;

        let root = plan
            .root()
            .ok_or_else(|| QueryError::InvalidRequest("request selects no tables".into()))?;

        let mut select = Vec::with_capacity(self.request.columns.len());
        let mut group_by = Vec::new();
        let mut order_by = Vec::new();
        for spec in &self.request.columns {
            let expr = self.select_expr(spec)?;

            if spec.group_by {
                group_by.push(expr.clone());
            }
            match spec.sort {
                Some(SortDirection::Asc) => order_by.push(OrderByExpr::asc(expr.clone())),
                Some(SortDirection::Desc) => order_by.push(OrderByExpr::desc(expr.clone())),
                None => {}
            }

            let mut item = SelectExpr::new(expr);
            if let Some(alias) = &spec.alias {
                item = item.with_alias(alias);
            }
            select.push(item);
        }

        let mut query = Query::new()
            .select(select)
            .from(table_ref(self.graph, root)?);

        for step in plan.steps() {
            let on = column_expr(self.graph, &step.left_table, &step.left_column)?
                .eq(column_expr(self.graph, &step.right_table, &step.right_column)?);
            query = query.inner_join(table_ref(self.graph, &step.right_table)?, on);
        }

        for predicate in predicates {
            query = query.filter(predicate.clone());
        }

        query = query.group_by(group_by).order_by(order_by);
        if let Some(limit) = self.request.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.request.offset {
            query = query.offset(offset);
        }

        let stage = ClausesAssembled {
            statement: query,
            params: params.clone(),
        };
        Ok(self.advance(stage, Stage::ClausesAssembled))
    }

    fn select_expr(&self, spec: &ColumnSpec) -> QueryResult<Expr> {
        let column = column_expr(self.graph, &spec.table, &spec.column)?;
        Ok(match spec.aggregate {
            Some(aggregate) => func(aggregate.function_name(), vec![column]),
            None => column,
        })
    }

    fn check_aggregation(&self) -> QueryResult<()> {
        let columns = &self.request.columns;

        for spec in columns {
            let Some(aggregate) = spec.aggregate else {
                continue;
            };
            let column_type = self.graph.column(&spec.table, &spec.column)?.column_type;
            if !aggregate_accepts(aggregate, column_type) {
                return Err(QueryError::InvalidAggregation(format!(
                    "{} is not defined for {} column '{}.{}'",
                    aggregate, column_type, spec.table, spec.column
                )));
            }
            if spec.group_by {
                return Err(QueryError::InvalidAggregation(format!(
                    "cannot group by aggregated column '{}.{}'",
                    spec.table, spec.column
                )));
            }
        }

        if columns.iter().any(|c| c.aggregate.is_some()) {
            if let Some(bare) = columns
                .iter()
                .find(|c| c.aggregate.is_none() && !c.group_by)
            {
                return Err(QueryError::InvalidAggregation(format!(
                    "column '{}.{}' must be grouped or aggregated",
                    bare.table, bare.column
                )));
            }
        }

        Ok(())
    }
}

impl<'g> QueryBuilder<'g, ClausesAssembled<Query>> {
    pub fn query(&self) -> &Query {
        &self.stage.statement
    }

    /// The assembled query and its parameters, for embedding in another
    /// statement.
    pub fn into_parts(self) -> (Query, Vec<Value>) {
        (self.stage.statement, self.stage.params)
    }

    /// Serialize for the builder's dialect.
    pub fn build(self) -> BuiltStatement {
        let tokens = self.stage.statement.to_tokens_for_dialect(self.dialect);
        debug_assert_eq!(tokens.placeholder_count(), self.stage.params.len());

        let statement = BuiltStatement {
            sql: tokens.serialize(self.dialect),
            params: self.stage.params,
        };
        debug!(stage = %Stage::Built, params = statement.params.len(), "select built");
        statement
    }
}

/// Run every stage in order.
pub fn build_select(
    graph: &SchemaGraph,
    dialect: Dialect,
    request: QueryRequest,
) -> QueryResult<BuiltStatement> {
    Ok(QueryBuilder::new(graph, dialect, request)
        .resolve_tables()?
        .resolve_joins()?
        .format_constraints()?
        .assemble_clauses()?
        .build())
}

fn aggregate_accepts(aggregate: Aggregate, column_type: ColumnType) -> bool {
    match aggregate {
        Aggregate::Count => true,
        Aggregate::Sum | Aggregate::Avg => column_type.is_numeric(),
        Aggregate::Min | Aggregate::Max => column_type != ColumnType::Boolean,
    }
}

/// `"schema"."table"."column"` for a column of a graph table.
pub(crate) fn column_expr(graph: &SchemaGraph, table: &str, column: &str) -> QueryResult<Expr> {
    let table = graph.table(table)?;
    Ok(schema_col(table.schema.as_deref(), &table.relation, column))
}

pub(crate) fn table_ref(graph: &SchemaGraph, table: &str) -> QueryResult<TableRef> {
    let table = graph.table(table)?;
    let table_ref = TableRef::new(&table.relation);
    Ok(match &table.schema {
        Some(schema) => table_ref.with_schema(schema),
        None => table_ref,
    })
}
