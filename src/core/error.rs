//! Error types for dispatch operations.

use thiserror::Error;

/// Errors produced by dispatch queues and task dispatchers.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue has been shut down and accepts no further work.
    #[error("dispatch queue has been shut down")]
    QueueClosed,
    /// The bound dispatcher refused to accept a task.
    #[error("dispatch rejected: {0}")]
    DispatchRejected(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
