//! CloudAtlas Graph: read-only access to the AWS infrastructure graph.
//!
//! All graph reads flow through this crate: the shared Neo4j connection,
//! normalization of driver values into plain JSON, identity resolution for
//! heterogeneously-labeled entities, bounded snapshot extraction, and the
//! fixed catalog of security queries.

pub mod catalog;
pub mod client;
pub mod identity;
pub mod normalize;
pub mod query;
pub mod snapshot;

pub use client::{GraphClient, GraphConfig, GraphError, GraphHandle};
pub use query::{CypherQuery, QueryParam, QueryRunner, Record};
