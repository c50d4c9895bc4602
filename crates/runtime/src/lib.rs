//! toolbridge runtime — tool sessions, reasoning backends and the query loop.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Session**: one connected tool service plus the [`ToolRegistry`] it
//!   advertised. Owns the child process.
//! - **Backend**: a trait abstracting reasoning providers (Anthropic, or a
//!   scripted stand-in for tests). Given a conversation and the tool catalog
//!   it returns either text or one tool call.
//! - **Orchestrator**: runs a query to completion, dispatching tool calls
//!   to the session and feeding results back, within a tool-call budget.
//!
//! # Example
//!
//! ```ignore
//! use mcp::Launchers;
//! use runtime::{AnthropicAuth, AnthropicBackend, Orchestrator, ProcessConnector, Session, Timeouts};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::connect(
//!     "weather.py",
//!     &Launchers::default(),
//!     &ProcessConnector,
//!     Timeouts::default(),
//! )
//! .await?;
//!
//! let auth = AnthropicAuth::ApiKey("sk-ant-api01-...".into());
//! let backend = AnthropicBackend::builder(auth, "claude-sonnet-4-20250514").build()?;
//! let orchestrator = Orchestrator::new(backend);
//!
//! let answer = orchestrator
//!     .run_query(&session, "Any weather alerts in CA?", &CancellationToken::new())
//!     .await?;
//! println!("{answer}");
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
mod orchestrator;
pub mod providers;
mod session;
pub mod tools;

// Error types
pub use error::{ConnectionError, OrchestrationError, Result, SessionError};

// Backend protocol (provider-agnostic)
pub use model::{Backend, ModelError, ModelRequest, Reply, ToolCall, ToolResult, Turn};

// Backend adapters
pub use providers::{AnthropicAuth, AnthropicBackend, AnthropicBackendBuilder, ScriptedBackend};

// Tools
pub use tools::{InvocationError, ToolDescriptor, ToolInvocationResult, ToolRegistry};

// Sessions
pub use session::{Connector, ProcessConnector, Session, SessionState, Timeouts, Transport};

// Query loop
pub use orchestrator::{
    DEFAULT_MAX_TOOL_CALLS, DEFAULT_RESPOND_TIMEOUT, Orchestrator, RunOptions, Transcript,
};
