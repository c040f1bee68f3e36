//! Dispatch queue configuration.

use serde::{Deserialize, Serialize};

/// Per-queue behaviour settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Process items still pending when shutdown catches the queue.
    /// When `false` they are discarded.
    #[serde(default)]
    pub drain_remaining_on_shutdown: bool,
}

impl QueueConfig {
    /// Create the default configuration (pending items discarded on shutdown).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            drain_remaining_on_shutdown: false,
        }
    }

    /// Set the shutdown policy for pending items.
    #[must_use]
    pub const fn with_drain_remaining_on_shutdown(mut self, value: bool) -> Self {
        self.drain_remaining_on_shutdown = value;
        self
    }

    /// Parse queue configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))
    }
}
