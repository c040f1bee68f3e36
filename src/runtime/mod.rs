//! Runtime adapters implementing [`TaskDispatcher`](crate::core::TaskDispatcher).

#[cfg(feature = "tokio-runtime")]
pub mod tokio_dispatcher;

#[cfg(feature = "tokio-runtime")]
pub use tokio_dispatcher::TokioDispatcher;
