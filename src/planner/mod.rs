//! Join planning over the schema graph.
//!
//! Given the tables a request touches, the resolver picks the foreign-key
//! edges that connect them. Plans are deterministic: neighbor order comes
//! from [`crate::schema::SchemaGraph::neighbors`] and the search frontier is
//! seeded in plan order.

mod join_resolver;

pub use join_resolver::{JoinPlan, JoinResolver, JoinStep};
