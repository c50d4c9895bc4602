//! Reasoning backend adapters.
//!
//! Each provider implements [`Backend`](crate::model::Backend) for its
//! specific API.

mod anthropic;
mod scripted;

pub use anthropic::{
    AnthropicAuth, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};
pub use scripted::{RecordedRequest, ScriptedBackend};
