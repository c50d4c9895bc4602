use std::time::Duration;

use thiserror::Error;

/// Why a dispatched tool call produced no usable output.
///
/// These never escape [`crate::Session::invoke`]; they are folded into a
/// failed [`ToolInvocationResult`](super::ToolInvocationResult).
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("tool reported an error: {0}")]
    Remote(String),
    #[error("malformed tool response: {0}")]
    Malformed(String),
}

impl InvocationError {
    /// Classify a transport error; `timeout` is the deadline that was in force.
    pub fn from_transport(err: mcp::Error, timeout: Duration) -> Self {
        match err {
            mcp::Error::Timeout => Self::Timeout(timeout),
            mcp::Error::ToolCallFailed(message) => Self::Remote(message),
            mcp::Error::JsonRpc(rpc) => Self::Remote(rpc.to_string()),
            mcp::Error::InvalidResponse(message) => Self::Malformed(message),
            mcp::Error::Serialize(e) => Self::Malformed(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// A tool call rejected before it reached the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// A tool listing that cannot become a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
}
