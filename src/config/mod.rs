//! Configuration models for queues, thread pools, and dispatcher selection.

pub mod dispatcher;
pub mod pool;
pub mod queue;

pub use dispatcher::DispatcherConfig;
pub use pool::ThreadPoolConfig;
pub use queue::QueueConfig;
