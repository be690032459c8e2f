//! CloudAtlas Tools: uniform invocation of the security catalog and graph
//! snapshot.
//!
//! The dispatcher resolves a tool by name, normalizes its arguments, runs it
//! against the shared graph handle, and maps failures to an `{error}`
//! envelope. The HTTP boundary and the `cloudatlas` binary sit on top.

pub mod args;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod server;

pub use dispatcher::{FailureKind, ToolDispatcher, ToolFailure};
pub use error::ToolError;
pub use registry::{Tool, ToolDescriptor};
