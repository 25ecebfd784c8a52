//! UPDATE assembly.

use tracing::debug;

use super::constraint::ConstraintFormatter;
use super::request::UpdateRequest;
use super::stage::{
    ClausesAssembled, ConstraintsFormatted, Empty, JoinsResolved, Stage, TablesResolved,
};
use super::statement::BuiltStatement;
use crate::error::QueryResult;
use crate::planner::JoinResolver;
use crate::schema::SchemaGraph;
use crate::sql::dml::Update;
use crate::sql::expr::{col, Expr};
use crate::sql::Dialect;

/// Builds a scoped, parameterized UPDATE from an [`UpdateRequest`].
///
/// Moves through the same stages as [`super::QueryBuilder`]. An update
/// always touches a single table, so its join plan is empty.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until built"]
pub struct UpdateBuilder<'g, S> {
    graph: &'g SchemaGraph,
    dialect: Dialect,
    request: UpdateRequest,
    assignments: Vec<(String, Expr)>,
    stage: S,
}

impl<'g, S> UpdateBuilder<'g, S> {
    fn advance<N>(self, stage: N, name: Stage) -> UpdateBuilder<'g, N> {
        debug!(stage = %name, table = %self.request.table, "update builder advanced");
        UpdateBuilder {
            graph: self.graph,
            dialect: self.dialect,
            request: self.request,
            assignments: self.assignments,
            stage,
        }
    }

    pub fn request(&self) -> &UpdateRequest {
        &self.request
    }
}

impl<'g> UpdateBuilder<'g, Empty> {
    pub fn new(graph: &'g SchemaGraph, dialect: Dialect, request: UpdateRequest) -> Self {
        Self {
            graph,
            dialect,
            request,
            assignments: Vec::new(),
            stage: Empty,
        }
    }

    /// Reject unscoped or malformed updates, then check the target table and
    /// every referenced column exist.
    pub fn resolve_tables(self) -> QueryResult<UpdateBuilder<'g, TablesResolved>> {
        self.request.validate()?;

        let table = &self.request.table;
        self.graph.table(table)?;
        for assignment in &self.request.assignments {
            self.graph.column(table, &assignment.column)?;
        }
        for constraint in &self.request.constraints {
            self.graph.column(table, &constraint.column)?;
        }

        let tables = vec![table.clone()];
        Ok(self.advance(TablesResolved { tables }, Stage::TablesResolved))
    }
}

impl<'g> UpdateBuilder<'g, TablesResolved> {
    pub fn resolve_joins(self) -> QueryResult<UpdateBuilder<'g, JoinsResolved>> {
        let plan = JoinResolver::new(self.graph).resolve(&self.stage.tables)?;
        Ok(self.advance(JoinsResolved { plan }, Stage::JoinsResolved))
    }
}

impl<'g> UpdateBuilder<'g, JoinsResolved> {
    /// Bind SET values first, then WHERE constraints, matching their order
    /// in the SQL text.
    pub fn format_constraints(mut self) -> QueryResult<UpdateBuilder<'g, ConstraintsFormatted>> {
        let table = &self.request.table;
        let mut formatter = ConstraintFormatter::new();

        let mut assignments = Vec::with_capacity(self.request.assignments.len());
        for assignment in &self.request.assignments {
            let column = self.graph.column(table, &assignment.column)?;
            let placeholder = formatter.bind(column, &assignment.value)?;
            assignments.push((assignment.column.clone(), placeholder));
        }

        let mut predicates = Vec::with_capacity(self.request.constraints.len());
        for constraint in &self.request.constraints {
            let column = self.graph.column(table, &constraint.column)?;
            predicates.push(formatter.format(
                column,
                col(&constraint.column),
                &constraint.operator,
                &constraint.value,
            )?);
        }

        self.assignments = assignments;
        let stage = ConstraintsFormatted {
            plan: self.stage.plan.clone(),
            predicates,
            params: formatter.into_params(),
        };
        Ok(self.advance(stage, Stage::ConstraintsFormatted))
    }
}

impl<'g> UpdateBuilder<'g, ConstraintsFormatted> {
    pub fn assemble_clauses(self) -> QueryResult<UpdateBuilder<'g, ClausesAssembled<Update>>> {
        let target = self.graph.table(&self.request.table)?;

        let mut update = Update::table(target.relation.as_str()).schema(target.schema.as_deref());
        for (column, value) in &self.assignments {
            update = update.set(column.as_str(), value.clone());
        }
        for predicate in &self.stage.predicates {
            update = update.filter(predicate.clone());
        }

        let stage = ClausesAssembled {
            statement: update,
            params: self.stage.params.clone(),
        };
        Ok(self.advance(stage, Stage::ClausesAssembled))
    }
}

impl<'g> UpdateBuilder<'g, ClausesAssembled<Update>> {
    pub fn update(&self) -> &Update {
        &self.stage.statement
    }

    pub fn build(self) -> BuiltStatement {
        let tokens = self.stage.statement.to_tokens(self.dialect);
        debug_assert_eq!(tokens.placeholder_count(), self.stage.params.len());

        let statement = BuiltStatement {
            sql: tokens.serialize(self.dialect),
            params: self.stage.params,
        };
        debug!(stage = %Stage::Built, params = statement.params.len(), "update built");
        statement
    }
}

/// Run every stage in order.
pub fn build_update(
    graph: &SchemaGraph,
    dialect: Dialect,
    request: UpdateRequest,
) -> QueryResult<BuiltStatement> {
    Ok(UpdateBuilder::new(graph, dialect, request)
        .resolve_tables()?
        .resolve_joins()?
        .format_constraints()?
        .assemble_clauses()?
        .build())
}
