//! Flowstate Collector
//!
//! Runs one polling loop per focus signal (HRV, notification rate, ambient
//! noise). Each loop walks an ordered chain of provider adapters with
//! simulated fallback, caches the last good value, and publishes into shared
//! state. An orchestrator periodically snapshots that state and posts it to a
//! downstream sink.

pub mod application;
pub mod config;
pub mod infrastructure;

pub use application::{
    AggregateState, Orchestrator, OrchestratorConfig, OrchestratorError, build_orchestrator,
};
pub use config::{CollectorConfigFile, ConfigError};
pub use infrastructure::{HttpSink, SourceRegistry};
