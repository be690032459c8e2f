//! Tool registry: the closed set of callable tools and their descriptors.

use serde::Serialize;
use serde_json::{json, Value};

use cloudatlas_core::RiskLevel;
use cloudatlas_graph::catalog::CatalogQuery;

const SNAPSHOT_TOOL: &str = "get_cloud_graph_snapshot";

/// Every tool the dispatcher can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Catalog(CatalogQuery),
    CloudGraphSnapshot,
}

impl Tool {
    pub fn all() -> Vec<Tool> {
        CatalogQuery::ALL
            .into_iter()
            .map(Tool::Catalog)
            .chain(std::iter::once(Tool::CloudGraphSnapshot))
            .collect()
    }

    pub fn parse(name: &str) -> Option<Self> {
        if name == SNAPSHOT_TOOL {
            return Some(Self::CloudGraphSnapshot);
        }
        CatalogQuery::from_name(name).map(Self::Catalog)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Catalog(query) => query.name(),
            Self::CloudGraphSnapshot => SNAPSHOT_TOOL,
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        let (description, category, risk_level) = match self {
            Self::Catalog(query) => match query {
                CatalogQuery::ListEc2Instances => (
                    "List all EC2 instances in the AWS infrastructure",
                    "EC2",
                    RiskLevel::Low,
                ),
                CatalogQuery::FindPublicEc2Instances => (
                    "Find EC2 instances exposed to the public internet",
                    "EC2",
                    RiskLevel::High,
                ),
                CatalogQuery::ListS3Buckets => (
                    "List all S3 buckets in the AWS account",
                    "S3",
                    RiskLevel::Low,
                ),
                CatalogQuery::FindPublicS3Buckets => (
                    "Find publicly accessible S3 buckets",
                    "S3",
                    RiskLevel::Critical,
                ),
                CatalogQuery::ListIamRoles => (
                    "List all IAM roles in the AWS account",
                    "IAM",
                    RiskLevel::Low,
                ),
                CatalogQuery::FindOverprivilegedIamRoles => (
                    "Find IAM roles with overly permissive policies",
                    "IAM",
                    RiskLevel::High,
                ),
                CatalogQuery::FindInternetExposedResources => (
                    "Find all resources exposed to the internet across services",
                    "Networking",
                    RiskLevel::High,
                ),
            },
            Self::CloudGraphSnapshot => (
                "Get a graph snapshot of cloud infrastructure relationships",
                "Visualization",
                RiskLevel::Low,
            ),
        };

        ToolDescriptor {
            name: self.name(),
            description,
            category,
            risk_level,
            input_schema: self.input_schema(),
            output_schema: self.output_schema(),
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            Self::Catalog(_) => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            Self::CloudGraphSnapshot => json!({
                "type": "object",
                "properties": {
                    "resourceType": {"type": "string", "description": "Node label to seed from, e.g. EC2Instance or S3Bucket. Non-identifier characters are stripped."},
                    "limit": {"type": "integer", "minimum": 1, "default": 100, "description": "Maximum number of seed nodes; their direct neighbors are always included"}
                },
                "additionalProperties": false
            }),
        }
    }

    fn output_schema(&self) -> Value {
        let row = match self {
            Self::Catalog(CatalogQuery::ListEc2Instances | CatalogQuery::FindPublicEc2Instances) => {
                json!({
                    "type": "object",
                    "required": ["id", "region", "isPublic"],
                    "properties": {
                        "id": {"type": "string"},
                        "region": {"type": "string"},
                        "publicIp": {"type": "string"},
                        "isPublic": {"type": "boolean"},
                        "instanceType": {"type": "string"},
                        "state": {"type": "string"}
                    }
                })
            }
            Self::Catalog(CatalogQuery::ListS3Buckets | CatalogQuery::FindPublicS3Buckets) => {
                json!({
                    "type": "object",
                    "required": ["name", "region", "isPublic"],
                    "properties": {
                        "name": {"type": "string"},
                        "region": {"type": "string"},
                        "isPublic": {"type": "boolean"},
                        "creationDate": {"type": "string"},
                        "versioningStatus": {"type": "string"}
                    }
                })
            }
            Self::Catalog(CatalogQuery::ListIamRoles | CatalogQuery::FindOverprivilegedIamRoles) => {
                json!({
                    "type": "object",
                    "required": ["name", "isOverprivileged"],
                    "properties": {
                        "name": {"type": "string"},
                        "arn": {"type": "string"},
                        "createDate": {"type": "string"},
                        "maxSessionDuration": {"type": "integer"},
                        "isOverprivileged": {"type": "boolean"},
                        "riskyPolicies": {"type": "array", "items": {"type": "string"}}
                    }
                })
            }
            Self::Catalog(CatalogQuery::FindInternetExposedResources) => json!({
                "type": "object",
                "required": ["id", "type", "exposureType", "riskLevel"],
                "properties": {
                    "id": {"type": "string"},
                    "type": {"type": "string", "enum": ["EC2Instance", "S3Bucket", "LoadBalancer", "RDSInstance"]},
                    "region": {"type": "string"},
                    "exposureType": {"type": "string"},
                    "riskLevel": risk_level_schema()
                }
            }),
            Self::CloudGraphSnapshot => json!({
                "type": "object",
                "required": ["summary", "nodes", "edges"],
                "properties": {
                    "summary": {"type": "string"},
                    "nodes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["id", "type", "label", "meta"],
                            "properties": {
                                "id": {"type": "string"},
                                "type": {"type": "string"},
                                "label": {"type": "string"},
                                "meta": {"type": "object"}
                            }
                        }
                    },
                    "edges": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["source", "target", "type"],
                            "properties": {
                                "source": {"type": "string"},
                                "target": {"type": "string"},
                                "type": {"type": "string"},
                                "meta": {"type": "object"}
                            }
                        }
                    }
                }
            }),
        };

        json!({
            "type": "object",
            "required": ["summary", "data"],
            "properties": {
                "summary": {"type": "string"},
                "data": {"type": "array", "items": row},
                "riskLevel": risk_level_schema()
            }
        })
    }
}

fn risk_level_schema() -> Value {
    json!({"type": "string", "enum": ["LOW", "MEDIUM", "HIGH", "CRITICAL"]})
}

/// Discovery metadata for one tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub risk_level: RiskLevel,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// Descriptors for every registered tool.
pub fn descriptors() -> Vec<ToolDescriptor> {
    Tool::all().iter().map(Tool::descriptor).collect()
}
