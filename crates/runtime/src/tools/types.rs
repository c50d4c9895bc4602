//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// A callable operation advertised by a tool service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    /// Free text shown to the reasoning backend.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub input_schema: Value,
}

impl From<mcp::Tool> for ToolDescriptor {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

/// Outcome of one tool invocation, always textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    pub ok: bool,
    pub text: String,
}

impl ToolInvocationResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    /// A failed invocation carrying the error's description.
    pub fn failure(error: impl Display) -> Self {
        Self {
            ok: false,
            text: format!("tool error: {error}"),
        }
    }
}
