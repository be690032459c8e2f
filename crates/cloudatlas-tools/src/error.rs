//! Error types for tool dispatch.

use cloudatlas_graph::GraphError;

/// Errors raised while resolving, binding or running a tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ToolError {
    /// Whether the caller is at fault. Everything else is a server failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArgument(_))
    }
}
