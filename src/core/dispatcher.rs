//! Task submission abstraction and the immediate dispatcher.

use std::sync::Arc;

use super::DispatchError;

/// A zero-argument unit of work handed to a [`TaskDispatcher`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Abstraction for "run this callable somewhere".
///
/// Implementations must run every accepted task exactly once, on whichever
/// thread they choose. A dispatcher that cannot accept work must return
/// [`DispatchError::DispatchRejected`] rather than dropping the task: a
/// dispatch queue whose drain task vanished would never make progress again.
///
/// # Example
///
/// ```
/// use prometheus_dispatch::core::{DispatchError, Task, TaskDispatcher};
///
/// struct Inline;
///
/// impl TaskDispatcher for Inline {
///     fn submit(&self, task: Task) -> Result<(), DispatchError> {
///         task();
///         Ok(())
///     }
/// }
/// ```
pub trait TaskDispatcher: Send + Sync {
    /// Accept a task for execution.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DispatchRejected`] if the task cannot be accepted.
    fn submit(&self, task: Task) -> Result<(), DispatchError>;
}

impl<D> TaskDispatcher for Arc<D>
where
    D: TaskDispatcher + ?Sized,
{
    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        (**self).submit(task)
    }
}

impl<D> TaskDispatcher for &D
where
    D: TaskDispatcher + ?Sized,
{
    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        (**self).submit(task)
    }
}

/// Runs every task synchronously on the submitting thread.
///
/// A dispatch queue bound to this dispatcher processes items before
/// `enqueue` returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDispatcher;

impl ImmediateDispatcher {
    /// Create an immediate dispatcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TaskDispatcher for ImmediateDispatcher {
    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        task();
        Ok(())
    }
}
