//! Reasoning backend protocol types and trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{Backend, ModelRequest, Reply, ToolCall, ToolResult, Turn};
