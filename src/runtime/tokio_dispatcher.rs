//! Tokio runtime dispatcher implementation.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::core::{DispatchError, Task, TaskDispatcher};

const PENDING: u8 = 0;
const ACCEPTED: u8 = 1;
const REFUSED: u8 = 2;

/// Wraps a task so that tokio dropping it unrun can be observed.
///
/// A runtime that is shutting down drops new blocking tasks inside
/// `spawn_blocking`, which leaves the slot `PENDING -> REFUSED` before the
/// call returns. A task dropped after it was accepted (queued when the
/// runtime began shutting down) is run on the dropping thread instead.
struct BlockingTask {
    task: Option<Task>,
    slot: Arc<AtomicU8>,
}

impl BlockingTask {
    fn run(mut self) {
        if let Some(task) = self.task.take() {
            task();
        }
    }
}

impl Drop for BlockingTask {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if self
            .slot
            .compare_exchange(PENDING, REFUSED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("tokio runtime dropped an accepted task; running it inline");
            task();
        }
    }
}

/// Dispatcher that runs tasks on a tokio runtime's blocking pool.
///
/// Drain tasks call arbitrary synchronous processors, so they go through
/// `spawn_blocking` rather than onto the async worker threads.
#[derive(Clone)]
pub struct TokioDispatcher {
    handle: tokio::runtime::Handle,
    /// Keeps an owned runtime alive for as long as the dispatcher.
    owned_runtime: Option<Arc<tokio::runtime::Runtime>>,
}

impl TokioDispatcher {
    /// Create a dispatcher from an existing runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            owned_runtime: None,
        }
    }

    /// Create a dispatcher for the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConfig`] outside a tokio runtime.
    pub fn current() -> Result<Self, DispatchError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| DispatchError::InvalidConfig(format!("no tokio runtime: {e}")))
    }

    /// Create a dispatcher owning a new multi-threaded runtime.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the runtime could not be built.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            owned_runtime: Some(Arc::new(runtime)),
        })
    }

    /// The runtime handle tasks are spawned on.
    #[must_use]
    pub const fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }
}

impl TaskDispatcher for TokioDispatcher {
    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        let slot = Arc::new(AtomicU8::new(PENDING));
        let wrapped = BlockingTask {
            task: Some(task),
            slot: Arc::clone(&slot),
        };
        drop(self.handle.spawn_blocking(move || wrapped.run()));

        match slot.compare_exchange(PENDING, ACCEPTED, Ordering::AcqRel, Ordering::Acquire) {
            // A task that already ran leaves the slot pending too.
            Ok(_) => Ok(()),
            Err(_) => Err(DispatchError::DispatchRejected(
                "tokio runtime is shut down".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for TokioDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioDispatcher")
            .field("owns_runtime", &self.owned_runtime.is_some())
            .finish_non_exhaustive()
    }
}
