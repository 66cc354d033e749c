//! The multi-target batch operation engine.

pub mod aggregator;
pub mod confirm;
pub mod dispatcher;
pub mod engine;
pub mod poller;
pub mod resolver;
