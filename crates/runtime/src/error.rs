use std::time::Duration;

use thiserror::Error;

use crate::model::ModelError;
use crate::tools::{RegistryError, ValidationError};

/// Failure to bring a session to Ready.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("unsupported service identifier: {0}")]
    Unsupported(mcp::Error),

    #[error("failed to start service {name}: {source}")]
    Start {
        name: String,
        #[source]
        source: mcp::Error,
    },

    #[error("failed to list tools from {name}: {source}")]
    ListTools {
        name: String,
        #[source]
        source: mcp::Error,
    },

    #[error("service {name} advertised an invalid tool list: {source}")]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("service {name} did not become ready within {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Errors from operations on a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not connected")]
    NotConnected,

    #[error("session is busy with another request")]
    Busy,

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] mcp::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnknownTool(name) => Self::UnknownTool(name),
            ValidationError::InvalidArguments { tool, reason } => {
                Self::InvalidArguments { tool, reason }
            }
        }
    }
}

impl SessionError {
    /// Whether the failure belongs to one tool call rather than the session.
    pub fn is_call_rejection(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments { .. })
    }
}

/// Why a query could not produce an answer.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("backend error: {0}")]
    Backend(#[from] ModelError),

    #[error("tool-call budget exhausted after {limit} calls")]
    BudgetExhausted { limit: usize },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("query cancelled")]
    Cancelled,
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
