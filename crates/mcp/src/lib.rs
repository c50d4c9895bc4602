//! MCP (Model Context Protocol) over stdio.
//!
//! This crate provides both halves of the stdio transport: a client handle
//! for a spawned tool server ([`Server`]) and a host loop for writing one
//! ([`host::serve_stdio`]).
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Launchers, Server};
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = Launchers::default().resolve("weather.py")?;
//!
//! let server = Server::spawn(config).await?;
//! server.initialize().await?;
//!
//! for tool in server.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = server.call_tool("get_alerts", Some(serde_json::json!({
//!     "state": "CA"
//! }))).await?;
//! println!("{}", result.joined_text());
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod host;
mod launch;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use launch::{Launcher, Launchers};
pub use protocol::{
    CallToolParams, CallToolResult, IncomingMessage, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ResourceContents, ServerCapabilities, ServerInfo, Tool, ToolContent, codes,
};
pub use server::{DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, Server, ServerConfig};
