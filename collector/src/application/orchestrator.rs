//! Collector lifecycle and periodic dispatch
//!
//! Starts one loop per enabled signal, waits a short startup delay, then every
//! send interval snapshots the aggregate state and hands a payload to the
//! sink. A failed dispatch is logged and the next one proceeds on schedule.

use std::sync::Arc;
use std::time::Duration;

use flowstate_core::{FocusPayload, ScoringConfig};
use flowstate_ports::{FocusSink, SinkResult};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::aggregate::{AggregateState, StatusReport};
use super::collector::{CollectorHandle, SignalCollector};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No signals enabled; nothing to collect")]
    NoEnabledSignals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    pub send_interval: Duration,
    pub startup_delay: Duration,
    pub shutdown_timeout: Duration,
    pub include_score: bool,
    pub scoring: ScoringConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            send_interval: Duration::from_secs(5),
            startup_delay: Duration::from_secs(2),
            shutdown_timeout: Duration::from_secs(2),
            include_score: false,
            scoring: ScoringConfig::default(),
        }
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    state: Arc<AggregateState>,
    sink: Arc<dyn FocusSink>,
    pending: Vec<SignalCollector>,
    running: Vec<CollectorHandle>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        state: Arc<AggregateState>,
        sink: Arc<dyn FocusSink>,
    ) -> Self {
        Orchestrator {
            config,
            state,
            sink,
            pending: Vec::new(),
            running: Vec::new(),
        }
    }

    pub fn add_collector(&mut self, collector: SignalCollector) {
        self.pending.push(collector);
    }

    pub fn state(&self) -> &Arc<AggregateState> {
        &self.state
    }

    /// Number of collectors added but not yet started
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn running(&self) -> &[CollectorHandle] {
        &self.running
    }

    /// Spawn every added collector. Returns how many were started.
    pub fn start(&mut self) -> Result<usize, OrchestratorError> {
        if self.pending.is_empty() && self.running.is_empty() {
            return Err(OrchestratorError::NoEnabledSignals);
        }
        let started = self.pending.len();
        for collector in self.pending.drain(..) {
            info!(signal = %collector.kind(), "Starting collector");
            self.running.push(collector.spawn());
        }
        Ok(started)
    }

    /// Build the payload for the current snapshot
    pub fn current_payload(&self) -> FocusPayload {
        let snapshot = self.state.snapshot();
        let payload = snapshot.to_payload();
        if self.config.include_score {
            payload.with_score(snapshot.score(&self.config.scoring))
        } else {
            payload
        }
    }

    /// Snapshot, build and send one payload
    pub async fn dispatch_once(&self) -> SinkResult<FocusPayload> {
        let payload = self.current_payload();
        self.sink.dispatch(&payload).await?;
        Ok(payload)
    }

    /// Dispatch on schedule until `stop` is set to true or its sender dropped
    pub async fn run_until(&self, mut stop: watch::Receiver<bool>) {
        info!(
            delay_ms = self.config.startup_delay.as_millis() as u64,
            "Waiting for collectors to initialize"
        );
        tokio::select! {
            _ = tokio::time::sleep(self.config.startup_delay) => {}
            _ = stop.changed() => {}
        }

        let mut sent: u64 = 0;
        while !*stop.borrow() {
            match self.dispatch_once().await {
                Ok(payload) => {
                    sent += 1;
                    info!(
                        sink = %self.sink.name(),
                        hrv = payload.hrv_rmssd,
                        notifications = payload.notification_count,
                        noise = payload.ambient_noise,
                        focus_score = ?payload.focus_score,
                        sent,
                        "Payload dispatched"
                    );
                }
                Err(e) => warn!(sink = %self.sink.name(), error = %e, "Dispatch failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.send_interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(sent, "Dispatch loop stopped");
    }

    /// Signal every collector and wait for each within the shutdown timeout.
    ///
    /// Returns the collectors that did not stop in time.
    pub async fn shutdown(&mut self) -> Vec<flowstate_core::SignalKind> {
        for handle in &self.running {
            handle.shutdown();
        }

        let mut stragglers = Vec::new();
        for handle in self.running.drain(..) {
            let kind = handle.kind();
            if !handle.join(self.config.shutdown_timeout).await {
                error!(
                    signal = %kind,
                    timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                    "Collector did not stop in time"
                );
                stragglers.push(kind);
            }
        }
        info!(stragglers = stragglers.len(), "Collectors shut down");
        stragglers
    }

    pub fn status_report(&self) -> StatusReport {
        self.state.status_report()
    }
}
