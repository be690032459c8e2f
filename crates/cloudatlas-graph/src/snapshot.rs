//! Bounded graph snapshots for visualization.
//!
//! A snapshot is built in two steps: [`build_query`] produces a seed-bounded,
//! one-hop traversal, and [`assemble`] turns its raw rows into a deduplicated
//! node/edge set keyed by resolved identity.
//!
//! `limit` bounds the seed entities only. One-hop neighbors are always
//! included, so a densely connected seed set can return more nodes than
//! `limit`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use cloudatlas_core::types::Meta;
use cloudatlas_core::{GraphEdge, GraphNode, GraphSnapshot, QueryResult};

use crate::client::GraphError;
use crate::identity;
use crate::query::{CypherQuery, QueryParam, QueryRunner, Record};

pub const DEFAULT_LIMIT: u32 = 100;
pub const SNAPSHOT_SUMMARY: &str = "Cloud infrastructure relationship graph";

const UNKNOWN_KIND: &str = "Unknown";

const COLUMNS: &[&str] = &[
    "seed",
    "seed_labels",
    "seed_key",
    "neighbor",
    "neighbor_labels",
    "neighbor_key",
    "rel_type",
    "rel_meta",
    "rel_outgoing",
];

// ── Request ───────────────────────────────────────────────────────

/// A node label reduced to `[A-Za-z0-9_]`.
///
/// The only caller-supplied text that reaches a query is embedded through
/// this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter(String);

impl LabelFilter {
    /// Strip every character outside the identifier class. An empty result
    /// means no filter.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated snapshot parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub resource_type: Option<LabelFilter>,
    pub limit: u32,
}

impl SnapshotRequest {
    pub fn new(resource_type: Option<&str>, limit: Option<u32>) -> Self {
        Self {
            resource_type: resource_type.and_then(LabelFilter::sanitize),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ── Query Builder ─────────────────────────────────────────────────

/// Build the seed-bounded, one-hop snapshot traversal.
///
/// Seeds are ordered by internal id before the limit applies so repeated runs
/// over an unchanged graph pick the same seeds.
pub fn build_query(request: &SnapshotRequest) -> CypherQuery {
    let filter = match &request.resource_type {
        Some(label) => format!("\n         WHERE seed:`{}`", label.as_str()),
        None => String::new(),
    };

    let text = format!(
        "MATCH (seed){filter}
         WITH seed ORDER BY id(seed) LIMIT $limit
         OPTIONAL MATCH (seed)-[rel]-(neighbor)
         RETURN seed, labels(seed) AS seed_labels, id(seed) AS seed_key,
                neighbor, labels(neighbor) AS neighbor_labels, id(neighbor) AS neighbor_key,
                type(rel) AS rel_type, properties(rel) AS rel_meta,
                startNode(rel) = seed AS rel_outgoing"
    );

    CypherQuery::new(text, COLUMNS).param("limit", QueryParam::Int(i64::from(request.limit)))
}

// ── Raw Rows ──────────────────────────────────────────────────────

/// An entity as it came back from the traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub labels: Vec<String>,
    pub properties: Meta,
    pub internal_id: Option<i64>,
}

impl RawEntity {
    fn kind(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or(UNKNOWN_KIND)
    }
}

/// A relationship between the seed and its neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRelation {
    pub rel_type: String,
    pub meta: Meta,
    /// The seed is the relationship's start node.
    pub outgoing: bool,
}

/// One traversal row: a seed, and optionally one neighbor and the
/// relationship joining them.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub seed: RawEntity,
    pub neighbor: Option<RawEntity>,
    pub relation: Option<RawRelation>,
}

impl SnapshotRow {
    /// Decode a normalized traversal record. Malformed rows yield `None`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let seed = entity(record, "seed", "seed_labels", "seed_key")?;
        let neighbor = entity(record, "neighbor", "neighbor_labels", "neighbor_key");
        let relation = record
            .get("rel_type")
            .and_then(Value::as_str)
            .map(|rel_type| RawRelation {
                rel_type: rel_type.to_string(),
                meta: object(record.get("rel_meta")).unwrap_or_default(),
                outgoing: record
                    .get("rel_outgoing")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            });

        Some(Self {
            seed,
            neighbor,
            relation,
        })
    }
}

fn entity(record: &Record, props: &str, labels: &str, key: &str) -> Option<RawEntity> {
    let properties = object(record.get(props))?;
    let labels = record
        .get(labels)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(RawEntity {
        labels,
        properties,
        internal_id: record.get(key).and_then(Value::as_i64),
    })
}

fn object(value: Option<&Value>) -> Option<Meta> {
    match value {
        Some(Value::Object(map)) => Some(map.clone()),
        _ => None,
    }
}

// ── Assembler ─────────────────────────────────────────────────────

/// Accumulates resolved nodes, keeping the first occurrence of each id.
#[derive(Default)]
struct NodeSet {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    unresolved: usize,
}

impl NodeSet {
    fn add(&mut self, entity: &RawEntity) -> Option<String> {
        let Some(resolved) =
            identity::resolve(entity.kind(), &entity.properties, entity.internal_id)
        else {
            self.unresolved += 1;
            return None;
        };

        if !self.index.contains_key(&resolved.id) {
            self.index.insert(resolved.id.clone(), self.nodes.len());
            self.nodes.push(GraphNode {
                id: resolved.id.clone(),
                node_type: resolved.kind,
                label: resolved.label,
                meta: entity.properties.clone(),
            });
        }
        Some(resolved.id)
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

/// Assemble raw traversal rows into a snapshot.
///
/// Never fails: unresolvable entities are excluded and any edge touching one
/// is dropped. Node and edge membership is determined by the rows alone.
pub fn assemble(summary: &str, rows: &[SnapshotRow]) -> GraphSnapshot {
    let mut node_set = NodeSet::default();
    let mut candidates = Vec::new();

    for row in rows {
        let seed_id = node_set.add(&row.seed);
        let neighbor_id = row.neighbor.as_ref().and_then(|n| node_set.add(n));

        if let (Some(relation), Some(seed_id), Some(neighbor_id)) =
            (&row.relation, seed_id, neighbor_id)
        {
            let (source, target) = if relation.outgoing {
                (seed_id, neighbor_id)
            } else {
                (neighbor_id, seed_id)
            };
            candidates.push(GraphEdge {
                source,
                target,
                edge_type: relation.rel_type.clone(),
                meta: (!relation.meta.is_empty()).then(|| relation.meta.clone()),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut dropped_edges = 0usize;
    let edges: Vec<GraphEdge> = candidates
        .into_iter()
        .filter(|edge| {
            if !node_set.contains(&edge.source) || !node_set.contains(&edge.target) {
                dropped_edges += 1;
                return false;
            }
            seen.insert((edge.source.clone(), edge.target.clone(), edge.edge_type.clone()))
        })
        .collect();

    tracing::debug!(
        nodes = node_set.nodes.len(),
        edges = edges.len(),
        unresolved = node_set.unresolved,
        dropped_edges,
        "Assembled graph snapshot"
    );
    if node_set.unresolved > 0 || dropped_edges > 0 {
        tracing::warn!(
            unresolved = node_set.unresolved,
            dropped_edges,
            "Dropped unresolvable snapshot entities"
        );
    }

    GraphSnapshot {
        summary: summary.to_string(),
        nodes: node_set.nodes,
        edges,
    }
}

/// Fetch and assemble a snapshot, wrapped in the uniform envelope.
pub async fn get_cloud_graph_snapshot<R>(
    runner: &R,
    request: &SnapshotRequest,
) -> Result<QueryResult<GraphSnapshot>, GraphError>
where
    R: QueryRunner + ?Sized,
{
    let query = build_query(request);
    let records = runner.fetch_records(&query).await?;
    let rows: Vec<SnapshotRow> = records.iter().filter_map(SnapshotRow::from_record).collect();
    if rows.len() < records.len() {
        tracing::debug!(
            malformed = records.len() - rows.len(),
            "Skipped malformed snapshot rows"
        );
    }

    let snapshot = assemble(SNAPSHOT_SUMMARY, &rows);
    Ok(QueryResult::new(SNAPSHOT_SUMMARY, vec![snapshot], None))
}
