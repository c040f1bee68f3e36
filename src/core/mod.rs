//! Core dispatch abstractions: the serial queue engine and task dispatchers.

pub mod action_queue;
pub mod dispatch_queue;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod thread_pool;

pub use action_queue::{invoke_action, Action, ActionDispatchQueue};
pub use dispatch_queue::{DispatchQueue, QueueStats, WorkProcessor};
pub use dispatcher::{ImmediateDispatcher, Task, TaskDispatcher};
pub use error::{AppResult, DispatchError};
pub use event::AutoResetEvent;
pub use thread_pool::{PoolStats, ThreadPoolDispatcher};
