//! Dispatch queue of closures.

use std::fmt;
use std::sync::Arc;

use crate::config::QueueConfig;

use super::{DispatchError, DispatchQueue, QueueStats, TaskDispatcher};

/// A boxed zero-argument closure queued for serial execution.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Processor that runs an [`Action`].
///
/// Pass it to [`DispatchQueue::new`] to build a closure queue that discards
/// pending actions on shutdown instead of running them.
pub fn invoke_action(action: Action) {
    action();
}

type ActionQueue = DispatchQueue<Action, fn(Action)>;

/// Runs closures one at a time, in the order they were enqueued.
///
/// Unlike a plain [`DispatchQueue`], actions still pending at shutdown are
/// always run before `shutdown` returns, and dropping the queue waits for
/// every accepted action.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use prometheus_dispatch::core::{ActionDispatchQueue, ImmediateDispatcher};
///
/// let count = Arc::new(AtomicUsize::new(0));
/// {
///     let queue = ActionDispatchQueue::new(Arc::new(ImmediateDispatcher));
///     let count = Arc::clone(&count);
///     queue.enqueue(move || { count.fetch_add(1, Ordering::SeqCst); }).unwrap();
/// }
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub struct ActionDispatchQueue {
    queue: ActionQueue,
}

impl ActionDispatchQueue {
    /// Create an action queue bound to `dispatcher`.
    pub fn new(dispatcher: Arc<dyn TaskDispatcher>) -> Self {
        let config = QueueConfig::new().with_drain_remaining_on_shutdown(true);
        Self {
            queue: DispatchQueue::with_config(dispatcher, invoke_action as fn(Action), config),
        }
    }

    /// Queue a closure for execution.
    ///
    /// # Errors
    ///
    /// See [`DispatchQueue::enqueue`].
    pub fn enqueue<F>(&self, action: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.enqueue(Box::new(action))
    }

    /// Queue a closure unless the queue has been shut down.
    ///
    /// # Errors
    ///
    /// See [`DispatchQueue::try_enqueue`].
    pub fn try_enqueue<F>(&self, action: F) -> Result<bool, DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.try_enqueue(Box::new(action))
    }

    /// Stop accepting actions and run everything already accepted.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    /// Whether `shutdown` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.queue.is_shut_down()
    }

    /// Whether a drain task is currently in flight.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.queue.is_draining()
    }

    /// Snapshot of the underlying queue's counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

impl fmt::Debug for ActionDispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatchQueue")
            .field("queue", &self.queue)
            .finish()
    }
}

impl Drop for ActionDispatchQueue {
    fn drop(&mut self) {
        self.queue.shutdown();
    }
}
