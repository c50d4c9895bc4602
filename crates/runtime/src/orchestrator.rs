//! The query loop: backend decides, session executes, repeat until text.

use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::OrchestrationError;
use crate::model::{Backend, ModelError, ModelRequest, Reply, ToolResult, Turn};
use crate::session::{Session, Transport};
use crate::tools::ToolInvocationResult;

/// Default cap on tool round trips per query.
pub const DEFAULT_MAX_TOOL_CALLS: usize = 8;

/// Default deadline for one backend call.
pub const DEFAULT_RESPOND_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-run limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_tool_calls: usize,
    pub respond_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            respond_timeout: DEFAULT_RESPOND_TIMEOUT,
        }
    }
}

/// The full record of one successful run.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub answer: String,
    pub turns: Vec<Turn>,
    pub tool_calls: usize,
}

/// Drives queries against a backend and a session.
///
/// Holds no per-query state, so one orchestrator can serve independent
/// queries against independent sessions concurrently.
pub struct Orchestrator<B> {
    backend: B,
    options: RunOptions,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, RunOptions::default())
    }

    pub fn with_options(backend: B, options: RunOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Answer `query`, calling tools as the backend asks.
    pub async fn run_query<T: Transport>(
        &self,
        session: &Session<T>,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String, OrchestrationError> {
        self.run_query_with_transcript(session, query, cancel)
            .await
            .map(|transcript| transcript.answer)
    }

    /// Like [`run_query`](Self::run_query), keeping every turn.
    pub async fn run_query_with_transcript<T: Transport>(
        &self,
        session: &Session<T>,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Transcript, OrchestrationError> {
        let span = info_span!("query", run = %Uuid::new_v4(), service = %session.name());
        self.drive(session, query, cancel).instrument(span).await
    }

    async fn drive<T: Transport>(
        &self,
        session: &Session<T>,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Transcript, OrchestrationError> {
        let mut turns = vec![Turn::user(query)];
        let mut tool_calls = 0;

        loop {
            if cancel.is_cancelled() {
                info!(tool_calls, "query cancelled");
                return Err(OrchestrationError::Cancelled);
            }

            let registry = session.registry().await;
            let request = ModelRequest {
                turns: &turns,
                tools: &registry,
            };

            debug!(turns = turns.len(), tools = registry.len(), "asking backend");
            let deadline = self.options.respond_timeout;
            let reply = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(tool_calls, "query cancelled while waiting for backend");
                    return Err(OrchestrationError::Cancelled);
                }
                reply = timeout(deadline, self.backend.respond(request)) => {
                    reply.map_err(|_| ModelError::Timeout(deadline))??
                }
            };

            let call = match reply {
                Reply::Text(answer) => {
                    info!(tool_calls, "backend answered");
                    turns.push(Turn::model(answer.clone()));
                    return Ok(Transcript {
                        answer,
                        turns,
                        tool_calls,
                    });
                }
                Reply::ToolCall(call) => call,
            };

            if tool_calls >= self.options.max_tool_calls {
                warn!(limit = self.options.max_tool_calls, tool = %call.name, "tool-call budget exhausted");
                return Err(OrchestrationError::BudgetExhausted {
                    limit: self.options.max_tool_calls,
                });
            }
            tool_calls += 1;

            info!(tool = %call.name, round = tool_calls, "backend requested tool");
            turns.push(Turn::ToolCall(call.clone()));

            let invoked = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(tool = %call.name, tool_calls, "query cancelled during tool call");
                    return Err(OrchestrationError::Cancelled);
                }
                invoked = session.invoke(&call.name, call.arguments.clone()) => invoked,
            };
            let result = match invoked {
                Ok(result) => result,
                Err(e) if e.is_call_rejection() => {
                    warn!(tool = %call.name, error = %e, "tool call rejected");
                    ToolInvocationResult::failure(e)
                }
                Err(e) => return Err(e.into()),
            };

            debug!(tool = %call.name, ok = result.ok, bytes = result.text.len(), "tool returned");
            turns.push(Turn::ToolResult(ToolResult::new(&call, result)));
        }
    }
}
