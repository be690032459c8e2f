//! Uniform tool invocation.
//!
//! The dispatcher is the single place where tool failures become the
//! caller-visible `{error}` envelope. No internal error type crosses it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use cloudatlas_graph::snapshot::get_cloud_graph_snapshot;
use cloudatlas_graph::{GraphError, QueryRunner};

use crate::args::{bind_snapshot_args, expect_no_args, normalize_args};
use crate::error::ToolError;
use crate::registry::Tool;

/// Who caused a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Client,
    Server,
}

/// The failure envelope handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    #[serde(skip)]
    pub kind: FailureKind,
    pub error: String,
}

impl From<ToolError> for ToolFailure {
    fn from(err: ToolError) -> Self {
        let kind = if err.is_client_error() {
            FailureKind::Client
        } else {
            FailureKind::Server
        };
        Self {
            kind,
            error: err.to_string(),
        }
    }
}

/// Routes named tool calls to the catalog or the snapshot pipeline.
pub struct ToolDispatcher<R: ?Sized> {
    runner: Arc<R>,
}

impl<R: ?Sized> Clone for ToolDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
        }
    }
}

impl<R: QueryRunner + ?Sized> ToolDispatcher<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Invoke a tool, mapping every failure to the envelope.
    pub async fn invoke(&self, name: &str, args: Option<Value>) -> Result<Value, ToolFailure> {
        let span = tracing::info_span!(
            "tool_call",
            tool = %name,
            request_id = %uuid::Uuid::new_v4()
        );

        async {
            match self.call(name, args).await {
                Ok(value) => {
                    tracing::info!("Tool call succeeded");
                    Ok(value)
                }
                Err(err) => {
                    if err.is_client_error() {
                        tracing::warn!(error = %err, "Tool call rejected");
                    } else {
                        tracing::error!(error = %err, "Tool call failed");
                    }
                    Err(ToolFailure::from(err))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Invoke a tool, surfacing the typed error.
    ///
    /// The name and arguments are validated before the graph is touched, so
    /// a bad request never triggers a connection attempt.
    pub async fn call(&self, name: &str, args: Option<Value>) -> Result<Value, ToolError> {
        let tool = Tool::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = normalize_args(args);

        match tool {
            Tool::Catalog(query) => {
                expect_no_args(&args)?;
                Ok(query.run_json(self.runner.as_ref()).await?)
            }
            Tool::CloudGraphSnapshot => {
                let request = bind_snapshot_args(&args)?;
                let result = get_cloud_graph_snapshot(self.runner.as_ref(), &request).await?;
                serde_json::to_value(result)
                    .map_err(|e| ToolError::Graph(GraphError::Serialization(e.to_string())))
            }
        }
    }
}
