//! cloudatlas-core: Shared types, configuration, and error handling for CloudAtlas.
//!
//! This crate provides the foundational types used across all CloudAtlas components:
//! - Graph snapshot types (GraphNode, GraphEdge, GraphSnapshot) for visualization
//! - The uniform `QueryResult` envelope and `RiskLevel` returned by catalog queries
//! - Row types for the security query catalog
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, Neo4jSettings, ServerSettings};
pub use error::CloudAtlasError;
pub use types::{
    Ec2Instance, ExposedResource, ExposedResourceType, GraphEdge, GraphNode, GraphSnapshot,
    IamRole, QueryResult, RiskLevel, S3Bucket,
};
