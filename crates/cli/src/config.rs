//! Configuration loading from toolbridge.toml.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use mcp::{Launcher, Launchers};
use runtime::{AnthropicAuth, DEFAULT_MAX_TOOL_CALLS, RunOptions, Timeouts};
use serde::Deserialize;

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "toolbridge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Deadlines and the tool-call budget.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Extra service kinds, keyed by file extension. Merged over the
    /// built-in `py` and `js` launchers.
    #[serde(default)]
    pub launchers: BTreeMap<String, Launcher>,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Standard Anthropic API key (sk-ant-api01-...).
    /// Mutually exclusive with oauth_token.
    pub api_key: Option<String>,

    /// Claude Code OAuth token (sk-ant-oat-...).
    /// Mutually exclusive with api_key.
    pub oauth_token: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional system prompt.
    pub system: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            oauth_token: None,
            max_tokens: default_max_tokens(),
            system: None,
        }
    }
}

/// Limits, in seconds where a duration is meant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_tool_calls: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub respond_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        let run = RunOptions::default();
        Self {
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            connect_timeout_secs: timeouts.connect.as_secs(),
            request_timeout_secs: timeouts.request.as_secs(),
            respond_timeout_secs: run.respond_timeout.as_secs(),
        }
    }
}

fn default_model() -> String {
    runtime::providers::DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    runtime::providers::DEFAULT_MAX_TOKENS
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if given, else [`CONFIG_FILE`] if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the authentication from config, falling back to the process
    /// environment.
    pub fn auth(&self) -> Result<AnthropicAuth, ConfigError> {
        self.auth_with(|key| std::env::var(key).ok())
    }

    /// Like [`auth`](Self::auth) with an explicit environment lookup.
    ///
    /// The config file wins and may set only one of api_key or oauth_token.
    /// Otherwise `ANTHROPIC_API_KEY` is tried before `ANTHROPIC_OAUTH_TOKEN`.
    pub fn auth_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<AnthropicAuth, ConfigError> {
        match (&self.backend.api_key, &self.backend.oauth_token) {
            (Some(key), None) => return Ok(AnthropicAuth::ApiKey(key.clone())),
            (None, Some(token)) => return Ok(AnthropicAuth::ClaudeCodeOauth(token.clone())),
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousAuth),
            (None, None) => {}
        }

        let present = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        if let Some(key) = present("ANTHROPIC_API_KEY") {
            Ok(AnthropicAuth::ApiKey(key))
        } else if let Some(token) = present("ANTHROPIC_OAUTH_TOKEN") {
            Ok(AnthropicAuth::ClaudeCodeOauth(token))
        } else {
            Err(ConfigError::MissingAuth)
        }
    }

    /// Built-in launchers plus the configured ones.
    pub fn launchers(&self) -> Launchers {
        self.launchers
            .iter()
            .fold(Launchers::default(), |launchers, (kind, launcher)| {
                launchers.with_kind(kind.as_str(), launcher.clone())
            })
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.limits.connect_timeout_secs),
            request: Duration::from_secs(self.limits.request_timeout_secs),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            max_tool_calls: self.limits.max_tool_calls,
            respond_timeout: Duration::from_secs(self.limits.respond_timeout_secs),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(
        "authentication not configured: set backend.api_key, backend.oauth_token or ANTHROPIC_API_KEY"
    )]
    MissingAuth,

    #[error(
        "ambiguous authentication: set either backend.api_key OR backend.oauth_token, not both"
    )]
    AmbiguousAuth,
}
