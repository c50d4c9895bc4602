//! Scripted backend.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::model::{Backend, ModelError, ModelRequest, Reply, Turn};

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub turns: Vec<Turn>,
    pub tools: Vec<String>,
}

enum Step {
    Reply(Reply),
    Fail(String),
    Stall(Duration, Reply),
}

/// A backend that replays a fixed script of replies.
///
/// Useful for testing the orchestration loop without a network. Once the
/// script runs out it repeats the fallback reply if one is set, otherwise
/// every call fails.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<Reply>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(Step::Reply).collect()),
            ..Self::default()
        }
    }

    /// A backend that answers every call with the same reply.
    pub fn repeating(reply: Reply) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::default()
        }
    }

    /// Queue one more reply.
    pub fn then_reply(mut self, reply: Reply) -> Self {
        self.script.get_mut().push_back(Step::Reply(reply));
        self
    }

    /// Queue a provider failure.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Step::Fail(message.into()));
        self
    }

    /// Queue a reply delivered only after `delay`.
    pub fn then_stall(mut self, delay: Duration, reply: Reply) -> Self {
        self.script.get_mut().push_back(Step::Stall(delay, reply));
        self
    }

    /// Every request received so far.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of calls made so far.
    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Backend for ScriptedBackend {
    async fn respond(&self, request: ModelRequest<'_>) -> Result<Reply, ModelError> {
        self.requests.lock().await.push(RecordedRequest {
            turns: request.turns.to_vec(),
            tools: request.tools.names().map(str::to_string).collect(),
        });

        let step = self.script.lock().await.pop_front();
        match step {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(message)) => Err(ModelError::Api(message)),
            Some(Step::Stall(delay, reply)) => {
                tokio::time::sleep(delay).await;
                Ok(reply)
            }
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ModelError::InvalidResponse("script exhausted".into())),
        }
    }
}
