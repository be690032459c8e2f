//! Core domain types for CloudAtlas.
//!
//! These types are the wire shapes handed back to callers: the graph snapshot
//! used for visualization and the risk-tagged envelopes returned by the
//! security query catalog.

use serde::{Deserialize, Serialize};

/// Property bag attached to nodes and edges.
pub type Meta = serde_json::Map<String, serde_json::Value>;

// ── Risk ──────────────────────────────────────────────────────────

/// Severity attached to a catalog result or to a single exposed resource.
///
/// Ordered from least to most severe so results can be ranked with `Ord`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Query Envelope ────────────────────────────────────────────────

/// Uniform envelope returned by every catalog query, independent of row shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub summary: String,
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl<T> QueryResult<T> {
    pub fn new(summary: impl Into<String>, data: Vec<T>, risk_level: Option<RiskLevel>) -> Self {
        Self {
            summary: summary.into(),
            data,
            risk_level,
        }
    }
}

// ── Graph Snapshot ────────────────────────────────────────────────

/// A resolved entity in a graph snapshot.
///
/// `id` is the externally stable identity (AWS id, name, ARN, ...), never a
/// database row identifier unless nothing else was available.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub meta: Meta,
}

/// A relationship between two nodes of the same snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// A bounded, point-in-time extraction of nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    pub summary: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn empty(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

// ── Catalog Rows ──────────────────────────────────────────────────

/// An EC2 instance row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Instance {
    pub id: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// An S3 bucket row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct S3Bucket {
    pub name: String,
    pub region: String,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning_status: Option<String>,
}

/// An IAM role row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IamRole {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_session_duration: Option<i64>,
    pub is_overprivileged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risky_policies: Option<Vec<String>>,
}

/// Resource kinds covered by the cross-service exposure query.
///
/// Declared in label order, so `Ord` sorts the same way the labels do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExposedResourceType {
    #[serde(rename = "EC2Instance")]
    Ec2Instance,
    #[serde(rename = "LoadBalancer")]
    LoadBalancer,
    #[serde(rename = "RDSInstance")]
    RdsInstance,
    #[serde(rename = "S3Bucket")]
    S3Bucket,
}

/// A resource reachable from the public internet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposedResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ExposedResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub exposure_type: String,
    pub risk_level: RiskLevel,
}
