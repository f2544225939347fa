//! Top-level runner errors.

use crate::config::ConfigError;
use crate::routing::RegistrationError;

/// Errors that stop the runner from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("discovery verb is not a standard HTTP method: {0:?}")]
    InvalidVerb(String),

    #[error("no bind address given")]
    NoBindAddress,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
