//! Builders to construct task dispatchers from configuration.

use std::sync::Arc;

use tracing::debug;

use crate::config::DispatcherConfig;
use crate::core::{ActionDispatchQueue, DispatchError, ImmediateDispatcher, TaskDispatcher, ThreadPoolDispatcher};

/// Build the dispatcher selected by `cfg`.
///
/// # Errors
///
/// - [`DispatchError::InvalidConfig`] if the configuration does not validate,
///   or selects the tokio adapter without the `tokio-runtime` feature
/// - [`DispatchError::Spawn`] if worker threads could not be started
pub fn build_dispatcher(cfg: &DispatcherConfig) -> Result<Arc<dyn TaskDispatcher>, DispatchError> {
    cfg.validate()
        .map_err(|e| DispatchError::InvalidConfig(format!("config invalid: {e}")))?;

    let dispatcher: Arc<dyn TaskDispatcher> = match cfg {
        DispatcherConfig::Immediate => Arc::new(ImmediateDispatcher),
        DispatcherConfig::ThreadPool(pool) => Arc::new(ThreadPoolDispatcher::new(pool.clone())?),
        DispatcherConfig::Tokio { worker_threads } => build_tokio(*worker_threads)?,
    };
    debug!(?cfg, "dispatcher built from configuration");
    Ok(dispatcher)
}

/// Build an [`ActionDispatchQueue`] on the dispatcher selected by `cfg`.
///
/// # Errors
///
/// See [`build_dispatcher`].
pub fn build_action_queue(cfg: &DispatcherConfig) -> Result<ActionDispatchQueue, DispatchError> {
    build_dispatcher(cfg).map(ActionDispatchQueue::new)
}

#[cfg(feature = "tokio-runtime")]
fn build_tokio(worker_threads: usize) -> Result<Arc<dyn TaskDispatcher>, DispatchError> {
    let dispatcher = crate::runtime::TokioDispatcher::with_worker_threads(worker_threads)?;
    Ok(Arc::new(dispatcher))
}

#[cfg(not(feature = "tokio-runtime"))]
fn build_tokio(_worker_threads: usize) -> Result<Arc<dyn TaskDispatcher>, DispatchError> {
    Err(DispatchError::InvalidConfig(
        "tokio dispatcher requires the `tokio-runtime` feature".into(),
    ))
}
