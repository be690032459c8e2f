//! Argument normalization and binding for tool calls.
//!
//! Callers pass arguments as nothing, a single value, or a positional array.
//! [`normalize_args`] reduces every shape to a positional list; the binders
//! below turn that list into a tool's typed input.

use serde::Deserialize;
use serde_json::Value;

use cloudatlas_graph::snapshot::SnapshotRequest;

use crate::error::ToolError;

/// Reduce a raw `args` value to positional arguments.
///
/// Absent (or `null`) means no arguments. An array is spread after dropping
/// trailing nulls; interior nulls are kept. Anything else is one argument.
pub fn normalize_args(args: Option<Value>) -> Vec<Value> {
    match args {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(mut items)) => {
            while matches!(items.last(), Some(Value::Null)) {
                items.pop();
            }
            items
        }
        Some(other) => vec![other],
    }
}

/// Accept no arguments, or a single empty object.
pub fn expect_no_args(args: &[Value]) -> Result<(), ToolError> {
    match args {
        [] => Ok(()),
        [Value::Object(map)] if map.is_empty() => Ok(()),
        _ => Err(ToolError::InvalidArgument(format!(
            "this tool takes no arguments, got {}",
            args.len()
        ))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SnapshotArgsObject {
    #[serde(default)]
    resource_type: Option<Value>,
    #[serde(default)]
    limit: Option<Value>,
}

/// Bind `[resourceType?, limit?]` or `{resourceType?, limit?}`.
pub fn bind_snapshot_args(args: &[Value]) -> Result<SnapshotRequest, ToolError> {
    let (resource_type, limit) = match args {
        [] => (None, None),
        [Value::Object(map)] => {
            let object: SnapshotArgsObject = serde_json::from_value(Value::Object(map.clone()))
                .map_err(|e| ToolError::InvalidArgument(e.to_string()))?;
            (object.resource_type, object.limit)
        }
        [resource_type] => (Some(resource_type.clone()), None),
        [resource_type, limit] => (Some(resource_type.clone()), Some(limit.clone())),
        _ => {
            return Err(ToolError::InvalidArgument(format!(
                "expected at most 2 arguments, got {}",
                args.len()
            )))
        }
    };

    let resource_type = match resource_type {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            return Err(ToolError::InvalidArgument(format!(
                "resourceType must be a string, got {other}"
            )))
        }
    };

    Ok(SnapshotRequest::new(
        resource_type.as_deref(),
        bind_limit(limit)?,
    ))
}

fn bind_limit(limit: Option<Value>) -> Result<Option<u32>, ToolError> {
    match limit {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolError::InvalidArgument(format!("limit must be a positive integer, got {value}"))
            }),
    }
}
