//! The seam between a session and the process it talks to.

use std::future::Future;

use mcp::{CallToolResult, Server, ServerConfig, Tool};
use serde_json::Value;

/// A connected tool service.
///
/// Implementations assume one request in flight at a time; [`Session`]
/// enforces that.
///
/// [`Session`]: super::Session
pub trait Transport: Send + Sync {
    fn list_tools(&self) -> impl Future<Output = mcp::Result<Vec<Tool>>> + Send;

    fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = mcp::Result<CallToolResult>> + Send;

    /// Release the service. Dropping without calling this must also release it.
    fn shutdown(self) -> impl Future<Output = mcp::Result<()>> + Send
    where
        Self: Sized;
}

/// Starts a service and completes its handshake.
pub trait Connector: Send + Sync {
    type Transport: Transport;

    fn connect(
        &self,
        config: ServerConfig,
    ) -> impl Future<Output = mcp::Result<Self::Transport>> + Send;
}

/// Spawns the service as a child process speaking MCP over stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessConnector;

impl Connector for ProcessConnector {
    type Transport = Server;

    async fn connect(&self, config: ServerConfig) -> mcp::Result<Server> {
        let server = Server::spawn(config).await?;
        // On handshake failure `server` drops here and the child is killed.
        server.initialize().await?;
        Ok(server)
    }
}

impl Transport for Server {
    async fn list_tools(&self) -> mcp::Result<Vec<Tool>> {
        Server::list_tools(self).await
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> mcp::Result<CallToolResult> {
        Server::call_tool(self, name, arguments).await
    }

    async fn shutdown(self) -> mcp::Result<()> {
        Server::shutdown(self).await
    }
}
