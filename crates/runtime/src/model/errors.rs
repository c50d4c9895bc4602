use std::time::Duration;

use thiserror::Error;

/// Errors from reasoning backend calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider returned an error response (auth, quota, bad request).
    #[error("provider api: {0}")]
    Api(String),

    /// The response was neither text nor a well-formed tool call.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// No response within the deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}
