//! MCP server management (spawn, communicate, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, RequestId, Tool,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum output size (1MB).
/// Sized for large tool outputs (file reads, search results).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Configuration for an MCP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Per-request response timeout.
    pub timeout: Duration,
}

/// The child's pipes. Held together so a request owns the wire from write to
/// matching read.
struct Io {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Bytes of a line whose newline has not arrived yet.
    pending: Vec<u8>,
    /// A write was abandoned mid-line; the child holds an unterminated line.
    torn_write: bool,
}

/// Handle to a running MCP server.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle on any
/// path terminates the process.
pub struct Server {
    config: ServerConfig,
    process: Mutex<Child>,
    io: Mutex<Io>,
    next_id: AtomicI64,
    initialized: AtomicBool,
}

impl Server {
    /// Spawn a new MCP server process.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn()?;
        debug!(server = %config.name, pid = ?process.id(), "spawned MCP server");

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        Ok(Self {
            config,
            process: Mutex::new(process),
            io: Mutex::new(Io {
                stdin,
                stdout: BufReader::new(stdout),
                pending: Vec::new(),
                torn_write: false,
            }),
            next_id: AtomicI64::new(1),
            initialized: AtomicBool::new(false),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Initialize the server (must be called before other operations).
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams::default();
        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        self.notify("notifications/initialized", None::<()>).await?;

        debug!(
            server = %self.config.name,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP handshake complete"
        );
        self.initialized.store(true, Ordering::SeqCst);

        Ok(result)
    }

    /// Check if the server is initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Fetch the list of tools the server currently advertises.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        Ok(result.tools)
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            return Err(Error::ToolCallFailed(result.joined_text()));
        }

        Ok(result)
    }

    /// Shut down the server gracefully.
    pub async fn shutdown(self) -> Result<()> {
        // Best effort: the server may already be gone.
        let _ = self.notify("shutdown", None::<()>).await;

        let mut process = self.process.lock().await;
        let _ = process.kill().await;
        debug!(server = %self.config.name, "MCP server stopped");

        Ok(())
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        let request_json = serde_json::to_string(&request)?;
        let mut io = self.io.lock().await;

        let exchange = async {
            write_line(&mut io, &request_json).await?;
            read_response(&mut io, &id).await
        };
        let response = timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)
            .map_err(|e| Error::InvalidResponse(format!("{method}: {e}")))?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        // Notifications have no ID
        let mut notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        if let Some(p) = params {
            notification["params"] = serde_json::to_value(p)?;
        }

        let notification_json = serde_json::to_string(&notification)?;
        let mut io = self.io.lock().await;
        timeout(self.config.timeout, write_line(&mut io, &notification_json))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

/// Write one newline-terminated line.
///
/// If an earlier write was dropped part way, its fragment is terminated
/// first. The child sees one unparseable line and answers it, if at all,
/// with a null id, which [`read_response`] discards.
async fn write_line(io: &mut Io, line: &str) -> Result<()> {
    if io.torn_write {
        io.stdin.write_all(b"\n").await?;
        io.torn_write = false;
    }

    io.torn_write = true;
    io.stdin.write_all(line.as_bytes()).await?;
    io.stdin.write_all(b"\n").await?;
    io.torn_write = false;
    io.stdin.flush().await?;
    Ok(())
}

/// Read lines until the response for `id` arrives.
///
/// Responses to earlier requests that timed out, server notifications and
/// non-JSON noise are skipped.
async fn read_response(io: &mut Io, id: &RequestId) -> Result<JsonRpcResponse> {
    loop {
        let line = read_line(io).await?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "skipping non-JSON line from server");
                continue;
            }
        };

        if value.get("method").is_some() {
            debug!(method = ?value.get("method"), "ignoring server-initiated message");
            continue;
        }

        let response: JsonRpcResponse = serde_json::from_value(value)
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        match &response.id {
            Some(got) if got == id => return Ok(response),
            other => debug!(expected = ?id, got = ?other, "discarding stale response"),
        }
    }
}

/// Read one newline-terminated line.
///
/// Partial lines are kept in `io.pending`, so a read abandoned by a timeout
/// resumes where it stopped on the next call.
async fn read_line(io: &mut Io) -> Result<String> {
    loop {
        let available = io.stdout.fill_buf().await?;
        if available.is_empty() {
            return Err(Error::ServerExited);
        }

        let (chunk, complete) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        io.pending.extend_from_slice(&available[..chunk]);
        io.stdout.consume(chunk);

        if io.pending.len() > MAX_OUTPUT_SIZE {
            let size = io.pending.len();
            io.pending.clear();
            return Err(Error::OutputTooLarge {
                size,
                max: MAX_OUTPUT_SIZE,
            });
        }

        if complete {
            let line = String::from_utf8_lossy(&io.pending).into_owned();
            io.pending.clear();
            return Ok(line);
        }
    }
}
