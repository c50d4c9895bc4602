//! Serving tools over stdio.
//!
//! The counterpart of [`crate::Server`]: a tool service implements
//! [`ToolHandler`] and hands it to [`serve_stdio`], which answers
//! `initialize`, `tools/list` and `tools/call` until stdin closes or the
//! client sends `shutdown`.

use std::future::Future;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, IncomingMessage, InitializeResult, JsonRpcError,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, Tool,
    codes,
};

/// A set of tools served to one client.
pub trait ToolHandler: Send + Sync {
    /// Name and version reported during the handshake.
    fn info(&self) -> ServerInfo;

    /// Tools advertised by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Run a tool. Failures are reported through [`CallToolResult::error`].
    fn call(&self, name: &str, arguments: Value) -> impl Future<Output = CallToolResult> + Send;
}

/// Serve `handler` on the process's stdin/stdout.
pub async fn serve_stdio<H: ToolHandler>(handler: &H) -> Result<()> {
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve `handler` on an arbitrary line-oriented stream pair.
pub async fn serve<H, R, W>(handler: &H, reader: R, mut writer: W) -> Result<()>
where
    H: ToolHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    info!(server = %handler.info().name, "serving tools over stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let message: IncomingMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                let response = JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(codes::PARSE_ERROR, e.to_string()),
                );
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        if message.method == "shutdown" {
            debug!("client requested shutdown");
            break;
        }

        if let Some(response) = dispatch(handler, message).await {
            write_response(&mut writer, &response).await?;
        }
    }

    info!("client disconnected");
    Ok(())
}

/// Handle one message. Notifications produce no response.
async fn dispatch<H: ToolHandler>(handler: &H, message: IncomingMessage) -> Option<JsonRpcResponse> {
    if message.jsonrpc != "2.0" {
        return message.id.map(|id| {
            JsonRpcResponse::failure(
                Some(id),
                JsonRpcError::new(codes::INVALID_REQUEST, "expected jsonrpc 2.0"),
            )
        });
    }

    if message.is_notification() {
        debug!(method = %message.method, "notification");
        return None;
    }
    let id = message.id;

    let response = match message.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities::tools_only(),
                server_info: handler.info(),
            },
        ),
        "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
        "tools/list" => JsonRpcResponse::success(
            id,
            ListToolsResult {
                tools: handler.tools(),
            },
        ),
        "tools/call" => {
            let params = message
                .params
                .map(serde_json::from_value::<CallToolParams>)
                .transpose();
            match params {
                Ok(Some(params)) => {
                    debug!(tool = %params.name, "tool call");
                    let arguments = params.arguments.unwrap_or(Value::Object(Default::default()));
                    let result = handler.call(&params.name, arguments).await;
                    JsonRpcResponse::success(id, result)
                }
                Ok(None) => JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(codes::INVALID_PARAMS, "missing params"),
                ),
                Err(e) => JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(codes::INVALID_PARAMS, e.to_string()),
                ),
            }
        }
        other => {
            warn!(method = other, "unknown method");
            JsonRpcResponse::failure(
                id,
                JsonRpcError::new(codes::METHOD_NOT_FOUND, format!("method not found: {other}")),
            )
        }
    };

    Some(response)
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
