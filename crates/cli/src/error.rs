//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The tool service could not be started.
    #[error(transparent)]
    Connection(#[from] runtime::ConnectionError),

    /// The backend client could not be built.
    #[error("backend setup failed: {0}")]
    Backend(#[from] runtime::ModelError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
