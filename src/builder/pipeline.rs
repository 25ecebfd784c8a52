//! Runtime drivers over the typed builder stages.
//!
//! The typed builders make out-of-order calls a compile error. The pipelines
//! hold the current stage as an enum instead, for callers that step through
//! assembly one transition at a time. Advancing a built pipeline fails with
//! [`QueryError::AlreadyBuilt`]; a failed transition discards the partial
//! statement.

use super::request::{QueryRequest, UpdateRequest};
use super::select::QueryBuilder;
use super::stage::{
    ClausesAssembled, ConstraintsFormatted, Empty, JoinsResolved, Stage, TablesResolved,
};
use super::statement::BuiltStatement;
use super::update::UpdateBuilder;
use crate::error::{QueryError, QueryResult};
use crate::schema::SchemaGraph;
use crate::sql::dml::Update;
use crate::sql::query::Query;
use crate::sql::Dialect;

// ============================================================================
// SELECT
// ============================================================================

#[derive(Debug)]
pub enum SelectPipeline<'g> {
    Empty(QueryBuilder<'g, Empty>),
    TablesResolved(QueryBuilder<'g, TablesResolved>),
    JoinsResolved(QueryBuilder<'g, JoinsResolved>),
    ConstraintsFormatted(QueryBuilder<'g, ConstraintsFormatted>),
    ClausesAssembled(QueryBuilder<'g, ClausesAssembled<Query>>),
    Built(BuiltStatement),
}

impl<'g> SelectPipeline<'g> {
    pub fn new(graph: &'g SchemaGraph, dialect: Dialect, request: QueryRequest) -> Self {
        SelectPipeline::Empty(QueryBuilder::new(graph, dialect, request))
    }

    pub fn stage(&self) -> Stage {
        match self {
            SelectPipeline::Empty(_) => Stage::Empty,
            SelectPipeline::TablesResolved(_) => Stage::TablesResolved,
            SelectPipeline::JoinsResolved(_) => Stage::JoinsResolved,
            SelectPipeline::ConstraintsFormatted(_) => Stage::ConstraintsFormatted,
            SelectPipeline::ClausesAssembled(_) => Stage::ClausesAssembled,
            SelectPipeline::Built(_) => Stage::Built,
        }
    }

    /// Perform the next transition.
    pub fn advance(self) -> QueryResult<Self> {
        Ok(match self {
            SelectPipeline::Empty(b) => SelectPipeline::TablesResolved(b.resolve_tables()?),
            SelectPipeline::TablesResolved(b) => SelectPipeline::JoinsResolved(b.resolve_joins()?),
            SelectPipeline::JoinsResolved(b) => {
                SelectPipeline::ConstraintsFormatted(b.format_constraints()?)
            }
            SelectPipeline::ConstraintsFormatted(b) => {
                SelectPipeline::ClausesAssembled(b.assemble_clauses()?)
            }
            SelectPipeline::ClausesAssembled(b) => SelectPipeline::Built(b.build()),
            SelectPipeline::Built(_) => return Err(QueryError::AlreadyBuilt),
        })
    }

    /// Advance until built.
    pub fn finish(self) -> QueryResult<BuiltStatement> {
        let mut pipeline = self;
        loop {
            pipeline = match pipeline {
                SelectPipeline::Built(statement) => return Ok(statement),
                other => other.advance()?,
            };
        }
    }

    pub fn statement(&self) -> Option<&BuiltStatement> {
        match self {
            SelectPipeline::Built(statement) => Some(statement),
            _ => None,
        }
    }
}

// ============================================================================
// UPDATE
// ============================================================================

#[derive(Debug)]
pub enum UpdatePipeline<'g> {
    Empty(UpdateBuilder<'g, Empty>),
    TablesResolved(UpdateBuilder<'g, TablesResolved>),
    JoinsResolved(UpdateBuilder<'g, JoinsResolved>),
    ConstraintsFormatted(UpdateBuilder<'g, ConstraintsFormatted>),
    ClausesAssembled(UpdateBuilder<'g, ClausesAssembled<Update>>),
    Built(BuiltStatement),
}

impl<'g> UpdatePipeline<'g> {
    pub fn new(graph: &'g SchemaGraph, dialect: Dialect, request: UpdateRequest) -> Self {
        UpdatePipeline::Empty(UpdateBuilder::new(graph, dialect, request))
    }

    pub fn stage(&self) -> Stage {
        match self {
            UpdatePipeline::Empty(_) => Stage::Empty,
            UpdatePipeline::TablesResolved(_) => Stage::TablesResolved,
            UpdatePipeline::JoinsResolved(_) => Stage::JoinsResolved,
            UpdatePipeline::ConstraintsFormatted(_) => Stage::ConstraintsFormatted,
            UpdatePipeline::ClausesAssembled(_) => Stage::ClausesAssembled,
            UpdatePipeline::Built(_) => Stage::Built,
        }
    }

    pub fn advance(self) -> QueryResult<Self> {
        Ok(match self {
            UpdatePipeline::Empty(b) => UpdatePipeline::TablesResolved(b.resolve_tables()?),
            UpdatePipeline::TablesResolved(b) => UpdatePipeline::JoinsResolved(b.resolve_joins()?),
            UpdatePipeline::JoinsResolved(b) => {
                UpdatePipeline::ConstraintsFormatted(b.format_constraints()?)
            }
            UpdatePipeline::ConstraintsFormatted(b) => {
                UpdatePipeline::ClausesAssembled(b.assemble_clauses()?)
            }
            UpdatePipeline::ClausesAssembled(b) => UpdatePipeline::Built(b.build()),
            UpdatePipeline::Built(_) => return Err(QueryError::AlreadyBuilt),
        })
    }

    pub fn finish(self) -> QueryResult<BuiltStatement> {
        let mut pipeline = self;
        loop {
            pipeline = match pipeline {
                UpdatePipeline::Built(statement) => return Ok(statement),
                other => other.advance()?,
            };
        }
    }

    pub fn statement(&self) -> Option<&BuiltStatement> {
        match self {
            UpdatePipeline::Built(statement) => Some(statement),
            _ => None,
        }
    }
}
