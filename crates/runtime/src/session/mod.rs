//! Session management.
//!
//! A [`Session`] owns one connected tool service and the [`ToolRegistry`] it
//! advertised. Sessions are created Ready by [`Session::connect`] and end
//! Closed; all other operations require Ready.

mod transport;

pub use transport::{Connector, ProcessConnector, Transport};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mcp::Launchers;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, Result, SessionError};
use crate::tools::{InvocationError, ToolInvocationResult, ToolRegistry};

/// Deadlines for transport round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Spawn, handshake and initial tool listing together.
    pub connect: Duration,
    /// One `tools/list` or `tools/call` round trip.
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            request: Duration::from_secs(60),
        }
    }
}

/// Lifecycle of a session.
///
/// Before [`Session::connect`] there is no session value at all; while it
/// runs the service is Connecting, and it hands back a Ready session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A connection to one tool service.
pub struct Session<T> {
    name: String,
    /// `None` once closed. The lock doubles as the one-in-flight guard.
    transport: Mutex<Option<T>>,
    registry: RwLock<Arc<ToolRegistry>>,
    closed: AtomicBool,
    timeouts: Timeouts,
}

impl<T: Transport> Session<T> {
    /// Start the service named by `identifier` and list its tools.
    ///
    /// The identifier's extension must be in `launchers`; otherwise this fails
    /// before anything is spawned.
    pub async fn connect<C>(
        identifier: &str,
        launchers: &Launchers,
        connector: &C,
        timeouts: Timeouts,
    ) -> Result<Self, ConnectionError>
    where
        C: Connector<Transport = T>,
    {
        let mut config = launchers
            .resolve(identifier)
            .map_err(ConnectionError::Unsupported)?;
        config.timeout = timeouts.request;
        let name = config.name.clone();

        debug!(service = %name, state = %SessionState::Connecting, command = %config.command, "connecting");

        let startup = async {
            let transport = connector
                .connect(config)
                .await
                .map_err(|source| ConnectionError::Start {
                    name: name.clone(),
                    source,
                })?;

            let tools = match transport.list_tools().await {
                Ok(tools) => tools,
                Err(source) => {
                    shutdown_quietly(&name, transport).await;
                    return Err(ConnectionError::ListTools {
                        name: name.clone(),
                        source,
                    });
                }
            };

            match ToolRegistry::from_tools(tools) {
                Ok(registry) => Ok((transport, registry)),
                Err(source) => {
                    shutdown_quietly(&name, transport).await;
                    Err(ConnectionError::Registry {
                        name: name.clone(),
                        source,
                    })
                }
            }
        };

        let (transport, registry) = timeout(timeouts.connect, startup)
            .await
            .map_err(|_| ConnectionError::Timeout {
                name: name.clone(),
                timeout: timeouts.connect,
            })??;

        info!(
            service = %name,
            state = %SessionState::Ready,
            tools = ?registry.names().collect::<Vec<_>>(),
            "connected"
        );

        Ok(Self {
            name,
            transport: Mutex::new(Some(transport)),
            registry: RwLock::new(Arc::new(registry)),
            closed: AtomicBool::new(false),
            timeouts,
        })
    }

    /// Service name (the identifier's file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        if self.closed.load(Ordering::SeqCst) {
            SessionState::Closed
        } else {
            SessionState::Ready
        }
    }

    /// Snapshot of the current registry.
    pub async fn registry(&self) -> Arc<ToolRegistry> {
        self.registry.read().await.clone()
    }

    /// Re-list the service's tools and swap in the new registry.
    ///
    /// On failure the previous registry stays in place.
    pub async fn list_tools(&self) -> Result<Arc<ToolRegistry>> {
        self.ensure_ready()?;
        let guard = self.transport.try_lock().map_err(|_| SessionError::Busy)?;
        let transport = guard.as_ref().ok_or(SessionError::NotConnected)?;

        let tools = timeout(self.timeouts.request, transport.list_tools())
            .await
            .map_err(|_| SessionError::Timeout(self.timeouts.request))??;
        let registry = Arc::new(ToolRegistry::from_tools(tools)?);

        *self.registry.write().await = registry.clone();
        debug!(service = %self.name, tools = registry.len(), "tool registry refreshed");
        Ok(registry)
    }

    /// Call a registered tool.
    ///
    /// Unknown tools and arguments that fail the tool's schema are rejected
    /// without touching the transport. Everything that goes wrong after
    /// dispatch comes back as a failed [`ToolInvocationResult`].
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolInvocationResult> {
        self.ensure_ready()?;
        self.registry().await.validate(name, &arguments)?;

        let guard = self.transport.try_lock().map_err(|_| SessionError::Busy)?;
        let transport = guard.as_ref().ok_or(SessionError::NotConnected)?;

        debug!(service = %self.name, tool = name, "invoking tool");
        let deadline = self.timeouts.request;
        let result = match timeout(deadline, transport.call_tool(name, Some(arguments))).await {
            Ok(Ok(result)) => ToolInvocationResult::success(result.joined_text()),
            Ok(Err(e)) => {
                let err = InvocationError::from_transport(e, deadline);
                warn!(service = %self.name, tool = name, error = %err, "tool call failed");
                ToolInvocationResult::failure(err)
            }
            Err(_) => {
                warn!(service = %self.name, tool = name, ?deadline, "tool call timed out");
                ToolInvocationResult::failure(InvocationError::Timeout(deadline))
            }
        };
        Ok(result)
    }

    /// Release the service. Safe to call any number of times, from any state.
    ///
    /// Waits for an in-flight call to finish first.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let transport = self.transport.lock().await.take();
        if let Some(transport) = transport {
            match timeout(self.timeouts.connect, transport.shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(service = %self.name, error = %e, "shutdown failed"),
                Err(_) => warn!(service = %self.name, "shutdown timed out"),
            }
            info!(service = %self.name, state = %SessionState::Closed, "session closed");
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            SessionState::Ready => Ok(()),
            _ => Err(SessionError::NotConnected),
        }
    }
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

async fn shutdown_quietly<T: Transport>(name: &str, transport: T) {
    if let Err(e) = transport.shutdown().await {
        debug!(service = %name, error = %e, "shutdown after failed connect");
    }
}
