//! Application Layer
//!
//! Collection loops, fallback, caching, shared state and dispatch scheduling.

mod aggregate;
mod bootstrap;
mod cache;
mod collector;
mod fallback;
mod orchestrator;

pub use aggregate::{AggregateState, SignalReport, SignalState, Snapshot, StatusReport};
pub use bootstrap::build_orchestrator;
pub use cache::{CacheRecord, CacheStore, CacheStoreError, SampleCache};
pub use collector::{CollectorHandle, CollectorSettings, CycleOutcome, SignalCollector};
pub use fallback::{ChainError, FallbackChain};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorError};
