use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarmPoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session pool is not running")]
    PoolNotRunning,

    #[error("No sessions available after {timeout:?} - all sessions are in use")]
    PoolExhausted { timeout: Duration },

    #[error(transparent)]
    Factory(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WarmPoolError {
    /// Whether the caller should treat this as backpressure rather than a fault.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::PoolNotRunning)
    }
}

pub type Result<T> = std::result::Result<T, WarmPoolError>;
