//! Anthropic API backend.

use std::time::Duration;

use crate::model::{Backend, ModelError, ModelRequest, Reply, ToolCall, Turn};
use crate::tools::{ToolDescriptor, ToolRegistry};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// Claude Code OAuth constants
const CLAUDE_CODE_VERSION: &str = "2.1.2";
const OAUTH_BETA_HEADER: &str = "claude-code-20250219,oauth-2025-04-20,fine-grained-tool-streaming-2025-05-14,interleaved-thinking-2025-05-14";
const OAUTH_SYSTEM_PREFIX: &str = "You are Claude Code, Anthropic's official CLI for Claude.";

/// Authentication mode for Anthropic API.
#[derive(Debug, Clone)]
pub enum AnthropicAuth {
    /// Standard API key authentication.
    ApiKey(String),
    /// Claude Code OAuth token authentication.
    ClaudeCodeOauth(String),
}

impl std::fmt::Display for AnthropicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "api_key"),
            Self::ClaudeCodeOauth(_) => write!(f, "claude_code_oauth"),
        }
    }
}

impl AnthropicAuth {
    fn apply_headers(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => req.header("x-api-key", key),
            Self::ClaudeCodeOauth(token) => req
                .header("anthropic-dangerous-direct-browser-access", "true")
                .header("Authorization", format!("Bearer {token}"))
                .header("anthropic-beta", OAUTH_BETA_HEADER)
                .header(
                    "user-agent",
                    format!("claude-cli/{CLAUDE_CODE_VERSION} (external, cli)"),
                )
                .header("x-app", "cli"),
        }
    }

    fn build_system(&self, system: Option<&str>) -> Option<ApiSystemPrompt> {
        match self {
            Self::ApiKey(_) => system.map(|s| ApiSystemPrompt::Simple(s.to_string())),
            Self::ClaudeCodeOauth(_) => {
                let mut blocks = vec![ApiSystemBlock::ephemeral(OAUTH_SYSTEM_PREFIX)];
                if let Some(s) = system {
                    blocks.push(ApiSystemBlock::ephemeral(s));
                }
                Some(ApiSystemPrompt::Blocks(blocks))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<ApiSystemPrompt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiSystemPrompt {
    Simple(String),
    Blocks(Vec<ApiSystemBlock>),
}

#[derive(Debug, Serialize)]
struct ApiSystemBlock {
    #[serde(rename = "type")]
    block_type: &'static str,
    text: String,
    cache_control: ApiCacheControl,
}

impl ApiSystemBlock {
    fn ephemeral(text: &str) -> Self {
        Self {
            block_type: "text",
            text: text.to_string(),
            cache_control: ApiCacheControl {
                control_type: "ephemeral",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiCacheControl {
    #[serde(rename = "type")]
    control_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    auth: AnthropicAuth,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    endpoint: String,
    timeout: Option<Duration>,
}

impl AnthropicBackendBuilder {
    pub fn new(auth: AnthropicAuth, model: impl Into<String>) -> Self {
        Self {
            auth,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            endpoint: ANTHROPIC_API_URL.to_string(),
            timeout: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the messages endpoint (proxies, gateways).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// HTTP-level timeout for each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AnthropicBackend, ModelError> {
        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(AnthropicBackend {
            client,
            auth: self.auth,
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            endpoint: self.endpoint,
        })
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    auth: AnthropicAuth,
    model: String,
    max_tokens: u32,
    system: Option<String>,
    endpoint: String,
}

impl AnthropicBackend {
    pub fn builder(auth: AnthropicAuth, model: impl Into<String>) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(auth, model)
    }

    fn turn_to_api(turn: &Turn) -> (&'static str, ApiContentBlock) {
        match turn {
            Turn::User { text } => ("user", ApiContentBlock::Text { text: text.clone() }),
            Turn::Model { text } => ("assistant", ApiContentBlock::Text { text: text.clone() }),
            Turn::ToolCall(call) => (
                "assistant",
                ApiContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                },
            ),
            Turn::ToolResult(result) => (
                "user",
                ApiContentBlock::ToolResult {
                    tool_use_id: result.call_id.clone(),
                    content: result.text.clone(),
                    is_error: !result.ok,
                },
            ),
        }
    }

    /// Map turns to API messages, merging consecutive turns of one role.
    fn turns_to_api(turns: &[Turn]) -> Vec<ApiMessage> {
        let mut messages: Vec<ApiMessage> = Vec::new();
        for turn in turns {
            let (role, block) = Self::turn_to_api(turn);
            match messages.last_mut() {
                Some(last) if last.role == role => last.content.push(block),
                _ => messages.push(ApiMessage {
                    role,
                    content: vec![block],
                }),
            }
        }
        messages
    }

    fn tool_to_api(descriptor: &ToolDescriptor) -> ApiTool {
        ApiTool {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            input_schema: descriptor.input_schema.clone(),
        }
    }

    fn catalog_to_api(tools: &ToolRegistry) -> Vec<ApiTool> {
        tools.descriptors().map(Self::tool_to_api).collect()
    }

    /// Reduce response blocks to one reply.
    ///
    /// A tool call wins over text; when several calls arrive only the first
    /// is taken, since the loop dispatches one call per step.
    fn response_to_reply(blocks: Vec<ApiResponseBlock>) -> Result<Reply, ModelError> {
        let mut texts = Vec::new();
        for block in blocks {
            match block {
                ApiResponseBlock::ToolUse { id, name, input } => {
                    if !input.is_object() {
                        return Err(ModelError::InvalidResponse(format!(
                            "tool_use '{name}' input is not an object"
                        )));
                    }
                    return Ok(Reply::ToolCall(ToolCall {
                        id,
                        name,
                        arguments: input,
                    }));
                }
                ApiResponseBlock::Text { text } => texts.push(text),
                ApiResponseBlock::Unknown => {}
            }
        }

        if texts.is_empty() {
            return Err(ModelError::InvalidResponse(
                "response contained neither text nor a tool call".into(),
            ));
        }
        Ok(Reply::Text(texts.join("")))
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({}, auth={})", self.model, self.auth)
    }
}

impl Backend for AnthropicBackend {
    async fn respond(&self, request: ModelRequest<'_>) -> Result<Reply, ModelError> {
        let api_request = ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: Self::turns_to_api(request.turns),
            system: self.auth.build_system(self.system.as_deref()),
            tools: Self::catalog_to_api(request.tools),
        };

        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "sending request to Anthropic"
        );

        let req = self
            .client
            .post(&self.endpoint)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json");

        let req = self.auth.apply_headers(req);

        let response = req
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Self::response_to_reply(api_response.content)
    }
}
