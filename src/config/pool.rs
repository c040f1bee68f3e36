//! Thread pool dispatcher configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable overriding [`ThreadPoolConfig::worker_count`].
pub const ENV_WORKERS: &str = "DISPATCH_POOL_WORKERS";
/// Environment variable overriding [`ThreadPoolConfig::max_queue_depth`].
pub const ENV_QUEUE_DEPTH: &str = "DISPATCH_POOL_QUEUE_DEPTH";
/// Environment variable overriding [`ThreadPoolConfig::thread_stack_size`].
pub const ENV_STACK_SIZE: &str = "DISPATCH_POOL_STACK_SIZE";
/// Environment variable overriding [`ThreadPoolConfig::shutdown_timeout_ms`].
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "DISPATCH_POOL_SHUTDOWN_TIMEOUT_MS";

const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;
const MIN_STACK_SIZE: usize = 64 * 1024;

fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}

const fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

fn default_thread_name_prefix() -> String {
    "dispatch-worker".into()
}

const fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

/// Configuration for [`ThreadPoolDispatcher`](crate::core::ThreadPoolDispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPoolConfig {
    /// Number of dedicated worker threads.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Maximum tasks waiting for a worker before `submit` rejects.
    /// Zero means unbounded.
    #[serde(default)]
    pub max_queue_depth: usize,
    /// Stack size for each worker thread, in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
    /// Prefix for worker thread names; the worker index is appended.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// How long `shutdown` waits for each worker to exit, in milliseconds.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            max_queue_depth: 0,
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: default_thread_name_prefix(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl ThreadPoolConfig {
    /// Create a configuration with one worker per CPU and an unbounded queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the maximum number of queued tasks (zero for unbounded).
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the per-worker join timeout used by `shutdown`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Per-worker join timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!(
                "thread_stack_size must be at least {MIN_STACK_SIZE} bytes"
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse thread pool configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file is loaded first if present. Unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but not a valid number, or if the
    /// resulting configuration does not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = lookup(ENV_WORKERS) {
            cfg.worker_count = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WORKERS}={value} is not a number"))?;
        }
        if let Some(value) = lookup(ENV_QUEUE_DEPTH) {
            cfg.max_queue_depth = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_QUEUE_DEPTH}={value} is not a number"))?;
        }
        if let Some(value) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_STACK_SIZE}={value} is not a number"))?;
        }
        if let Some(value) = lookup(ENV_SHUTDOWN_TIMEOUT_MS) {
            cfg.shutdown_timeout_ms = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SHUTDOWN_TIMEOUT_MS}={value} is not a number"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
