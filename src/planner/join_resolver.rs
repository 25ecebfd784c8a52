//! Join resolution: the minimal tree of foreign-key joins connecting a set
//! of tables.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::schema::{ForeignKeyEdge, SchemaError, SchemaGraph};

/// One INNER JOIN: `right_table` is the table the step introduces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

impl From<ForeignKeyEdge> for JoinStep {
    fn from(edge: ForeignKeyEdge) -> Self {
        JoinStep {
            left_table: edge.table,
            left_column: edge.column,
            right_table: edge.other_table,
            right_column: edge.other_column,
        }
    }
}

/// Ordered joins forming a tree over the requested tables and any
/// intermediates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    tables: Vec<String>,
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    /// The FROM table.
    pub fn root(&self) -> Option<&str> {
        self.tables.first().map(String::as_str)
    }

    /// Every table in the plan, in the order it was introduced.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Resolves join plans against one schema snapshot.
pub struct JoinResolver<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> JoinResolver<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Connect `tables` (request order, duplicates ignored) with the fewest
    /// joins the incremental search finds.
    ///
    /// Each unresolved target gets one breadth-first search whose frontier
    /// starts from every table already in the plan. Tables already in the
    /// plan are never re-entered, so the result is a tree.
    pub fn resolve<S: AsRef<str>>(&self, tables: &[S]) -> QueryResult<JoinPlan> {
        let mut requested: Vec<&str> = Vec::with_capacity(tables.len());
        for table in tables {
            let table = table.as_ref();
            if !self.graph.contains(table) {
                return Err(SchemaError::UnknownTable(table.to_string()).into());
            }
            if !requested.contains(&table) {
                requested.push(table);
            }
        }

        let mut plan = JoinPlan::default();
        let Some((first, rest)) = requested.split_first() else {
            return Ok(plan);
        };

        let mut in_plan: HashSet<String> = HashSet::new();
        plan.tables.push(first.to_string());
        in_plan.insert(first.to_string());

        for target in rest {
            if in_plan.contains(*target) {
                debug!(table = %target, "already joined as intermediate");
                continue;
            }

            let path = self.shortest_path(&plan.tables, &in_plan, target)?;
            debug!(
                table = %target,
                hops = path.len(),
                "resolved join path"
            );

            for edge in path {
                in_plan.insert(edge.other_table.clone());
                plan.tables.push(edge.other_table.clone());
                plan.steps.push(edge.into());
            }
        }

        Ok(plan)
    }

    /// BFS from every plan table to `target`, returning the edges to add.
    fn shortest_path(
        &self,
        frontier: &[String],
        in_plan: &HashSet<String>,
        target: &str,
    ) -> QueryResult<Vec<ForeignKeyEdge>> {
        let mut queue: VecDeque<String> = frontier.iter().cloned().collect();
        let mut visited: HashSet<String> = in_plan.clone();
        let mut parent: HashMap<String, ForeignKeyEdge> = HashMap::new();

        while let Some(current) = queue.pop_front() {
            for edge in self.graph.neighbors(&current) {
                if visited.contains(&edge.other_table) {
                    continue;
                }
                visited.insert(edge.other_table.clone());
                let neighbor = edge.other_table.clone();
                parent.insert(neighbor.clone(), edge);

                if neighbor == target {
                    return Ok(reconstruct_path(target, in_plan, &parent));
                }
                queue.push_back(neighbor);
            }
        }

        Err(QueryError::UnreachableTable {
            table: target.to_string(),
        })
    }
}

/// Walk parent pointers back from `target` to the first table already in
/// the plan, returning edges in join order.
fn reconstruct_path(
    target: &str,
    in_plan: &HashSet<String>,
    parent: &HashMap<String, ForeignKeyEdge>,
) -> Vec<ForeignKeyEdge> {
    let mut path = Vec::new();
    let mut current = target;

    while !in_plan.contains(current) {
        let Some(edge) = parent.get(current) else {
            break;
        };
        path.push(edge.clone());
        current = &edge.table;
    }

    path.reverse();
    path
}
