//! Dispatcher adapter selection.

use serde::{Deserialize, Serialize};

use super::ThreadPoolConfig;

/// Which [`TaskDispatcher`](crate::core::TaskDispatcher) backs a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatcherConfig {
    /// Run drain tasks inline on the enqueuing thread.
    Immediate,
    /// Dedicated OS worker threads.
    ThreadPool(ThreadPoolConfig),
    /// A tokio multi-threaded runtime owned by the dispatcher.
    Tokio {
        /// Number of runtime worker threads.
        worker_threads: usize,
    },
}

impl DispatcherConfig {
    /// Validate the selected adapter's settings.
    ///
    /// # Errors
    ///
    /// Returns a description of the invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Immediate => Ok(()),
            Self::ThreadPool(pool) => pool
                .validate()
                .map_err(|e| format!("thread_pool invalid: {e}")),
            Self::Tokio { worker_threads } => {
                if *worker_threads == 0 {
                    Err("tokio worker_threads must be greater than 0".into())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Parse dispatcher configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
