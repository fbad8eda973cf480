//! Per-signal polling loop
//!
//! Each cycle either republishes a fresh cached value or fetches through the
//! fallback chain, then sleeps for the collector interval (or the retry
//! backoff after a failure). A panic inside a cycle is caught, logged and
//! treated as a failed cycle. The loop exits when its stop signal fires, even
//! in the middle of a fetch.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use flowstate_core::SignalKind;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::aggregate::AggregateState;
use super::cache::SampleCache;
use super::fallback::FallbackChain;

/// Resolved per-collector settings
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    pub kind: SignalKind,
    pub interval: Duration,
    pub cache_ttl: Duration,
    pub cache_path: Option<PathBuf>,
    pub retry_backoff: Duration,
    pub fetch_timeout: Duration,
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Fetched,
    Cached,
    Failed,
}

pub struct SignalCollector {
    settings: CollectorSettings,
    chain: FallbackChain,
    cache: SampleCache,
    state: Arc<AggregateState>,
}

impl SignalCollector {
    pub fn new(
        settings: CollectorSettings,
        chain: FallbackChain,
        cache: SampleCache,
        state: Arc<AggregateState>,
    ) -> Self {
        SignalCollector {
            settings,
            chain,
            cache,
            state,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.settings.kind
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// One collection cycle
    pub async fn cycle(&mut self) -> CycleOutcome {
        let kind = self.settings.kind;

        let cached = if self.cache.should_refresh() {
            None
        } else {
            self.cache.get()
        };
        if let Some(sample) = cached {
            debug!(signal = %kind, value = sample.value, source = %sample.source_name, "Using cached value");
            self.state.update(kind, sample.value);
            return CycleOutcome::Cached;
        }

        match self.chain.fetch().await {
            Ok(sample) => {
                self.cache.put(sample.value, &sample.source_name);
                self.state.update(kind, sample.value);
                info!(signal = %kind, value = sample.value, source = %sample.source_name, "Collected");
                CycleOutcome::Fetched
            }
            Err(e) => {
                warn!(signal = %kind, error = %e, "Collection failed");
                self.state.mark_failed(kind);
                CycleOutcome::Failed
            }
        }
    }

    /// Run until `stop` is set to true or its sender is dropped
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let kind = self.settings.kind;
        if self.cache.warm() {
            debug!(signal = %kind, "Cache warmed from disk");
        }
        info!(
            signal = %kind,
            interval_secs = self.settings.interval.as_secs(),
            sources = ?self.chain.active_sources(),
            "Collector started"
        );

        loop {
            if *stop.borrow() {
                break;
            }

            // A stop request cancels the in-flight cycle.
            let result = tokio::select! {
                result = AssertUnwindSafe(self.cycle()).catch_unwind() => result,
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(panic) => {
                    error!(signal = %kind, panic = %panic_message(panic.as_ref()), "Collector cycle panicked");
                    self.state.mark_failed(kind);
                    CycleOutcome::Failed
                }
            };

            let delay = match outcome {
                CycleOutcome::Failed => self.settings.retry_backoff,
                CycleOutcome::Fetched | CycleOutcome::Cached => self.settings.interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(signal = %kind, "Collector stopped");
    }

    /// Spawn the loop onto the runtime
    pub fn spawn(self) -> CollectorHandle {
        let kind = self.settings.kind;
        let (shutdown, stop) = watch::channel(false);
        let handle = tokio::spawn(self.run(stop));
        CollectorHandle {
            kind,
            handle,
            shutdown,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to a running collector loop
pub struct CollectorHandle {
    kind: SignalKind,
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl CollectorHandle {
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Ask the loop to stop; it exits at its next await point
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Wait up to `timeout` for the loop to exit. Returns false (and aborts the
    /// task) if it did not.
    pub async fn join(mut self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(signal = %self.kind, error = %e, "Collector task ended abnormally");
                true
            }
            Err(_) => {
                self.handle.abort();
                false
            }
        }
    }
}
