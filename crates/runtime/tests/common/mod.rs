//! In-process stand-ins for a tool service.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mcp::{CallToolResult, Launchers, ServerConfig, Tool};
use runtime::{Connector, Session, Timeouts, Transport};
use serde_json::{Value, json};

/// Counters shared between a connector, its transports and the test.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    spawns: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl Stats {
    pub fn spawns(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

pub fn echo_tool() -> Tool {
    Tool {
        name: "echo".into(),
        description: Some("Echo text back".into()),
        input_schema: json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"]
        }),
    }
}

pub fn failing_tool() -> Tool {
    Tool {
        name: "fail".into(),
        description: Some("Always fails".into()),
        input_schema: json!({"type": "object"}),
    }
}

pub fn slow_tool() -> Tool {
    Tool {
        name: "slow".into(),
        description: Some("Takes its time".into()),
        input_schema: json!({"type": "object"}),
    }
}

/// Serves `echo`, `fail` and `slow` from memory.
pub struct StubTransport {
    tools: Arc<Mutex<Vec<Tool>>>,
    slow_delay: Duration,
    stats: Stats,
}

impl Transport for StubTransport {
    async fn list_tools(&self) -> mcp::Result<Vec<Tool>> {
        let tools = self.tools.lock().unwrap().clone();
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> mcp::Result<CallToolResult> {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        let arguments = arguments.unwrap_or(Value::Null);
        match name {
            "echo" => Ok(CallToolResult::text(
                arguments["text"].as_str().unwrap_or_default(),
            )),
            "fail" => Err(mcp::Error::ToolCallFailed("upstream unavailable".into())),
            "slow" => {
                tokio::time::sleep(self.slow_delay).await;
                Ok(CallToolResult::text("done"))
            }
            other => Err(mcp::Error::JsonRpc(mcp::JsonRpcError::new(
                mcp::codes::METHOD_NOT_FOUND,
                format!("no tool {other}"),
            ))),
        }
    }

    async fn shutdown(self) -> mcp::Result<()> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`StubTransport`]s instead of spawning processes.
#[derive(Clone)]
pub struct StubConnector {
    pub tools: Arc<Mutex<Vec<Tool>>>,
    pub connect_delay: Duration,
    pub slow_delay: Duration,
    pub stats: Stats,
}

impl StubConnector {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools: Arc::new(Mutex::new(tools)),
            connect_delay: Duration::ZERO,
            slow_delay: Duration::from_millis(300),
            stats: Stats::default(),
        }
    }

    pub fn echo() -> Self {
        Self::new(vec![echo_tool(), failing_tool(), slow_tool()])
    }

    /// Replace what the service will advertise on the next listing.
    pub fn advertise(&self, tools: Vec<Tool>) {
        *self.tools.lock().unwrap() = tools;
    }
}

impl Connector for StubConnector {
    type Transport = StubTransport;

    async fn connect(&self, config: ServerConfig) -> mcp::Result<StubTransport> {
        self.stats.spawns.fetch_add(1, Ordering::SeqCst);
        self.stats.commands.lock().unwrap().push(config.command.clone());
        tokio::time::sleep(self.connect_delay).await;
        Ok(StubTransport {
            tools: self.tools.clone(),
            slow_delay: self.slow_delay,
            stats: self.stats.clone(),
        })
    }
}

pub fn quick_timeouts() -> Timeouts {
    Timeouts {
        connect: Duration::from_secs(2),
        request: Duration::from_millis(100),
    }
}

pub async fn connect(connector: &StubConnector) -> Session<StubTransport> {
    Session::connect("tool.py", &Launchers::default(), connector, quick_timeouts())
        .await
        .expect("stub service connects")
}
