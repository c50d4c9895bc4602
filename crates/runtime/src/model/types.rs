use super::errors::ModelError;
use crate::tools::{ToolInvocationResult, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates the call with its result on the wire.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// The runtime's answer to a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub ok: bool,
    pub text: String,
}

impl ToolResult {
    pub fn new(call: &ToolCall, result: ToolInvocationResult) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            ok: result.ok,
            text: result.text,
        }
    }
}

/// One entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    /// Text from the person asking.
    User { text: String },
    /// Free text from the model.
    Model { text: String },
    /// The model asking for a tool.
    ToolCall(ToolCall),
    /// What the tool returned.
    ToolResult(ToolResult),
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::Model { text: text.into() }
    }
}

/// What a backend decided to do with a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A final answer.
    Text(String),
    /// A request to run exactly one tool.
    ToolCall(ToolCall),
}

/// Everything needed for a backend request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub turns: &'a [Turn],
    pub tools: &'a ToolRegistry,
}

/// A reasoning backend.
///
/// Implementations keep no per-conversation state: everything they need
/// arrives in the request.
pub trait Backend: Send + Sync {
    fn respond(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<Reply, ModelError>> + Send;
}
