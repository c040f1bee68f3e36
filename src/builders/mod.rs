//! Builders to construct dispatchers and queues from configuration.

pub mod dispatcher_builder;

pub use dispatcher_builder::{build_action_queue, build_dispatcher};
