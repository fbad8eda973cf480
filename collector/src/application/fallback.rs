//! Ordered provider fallback for one signal
//!
//! Sources are tried first to last; the first success wins. Sources that fail
//! validation at construction are skipped for the life of the chain, as are
//! sources that later report a configuration error. When every source fails
//! and the chain has no simulated source, a fresh simulated one is tried once
//! so a value is still produced.

use std::sync::Arc;
use std::time::Duration;

use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{Clock, SignalSource, SourceError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::SimulatedSource;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("All {attempted} sources for {kind} failed")]
    Exhausted { kind: SignalKind, attempted: usize },
}

struct ChainEntry {
    source: Box<dyn SignalSource>,
    usable: bool,
}

pub struct FallbackChain {
    kind: SignalKind,
    entries: Vec<ChainEntry>,
    has_simulated: bool,
    fetch_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl FallbackChain {
    /// Build a chain. An empty list becomes a single simulated source.
    pub fn new(
        kind: SignalKind,
        sources: Vec<Box<dyn SignalSource>>,
        fetch_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sources = if sources.is_empty() {
            info!(signal = %kind, "No sources configured, using simulated data");
            vec![Box::new(SimulatedSource::new(kind, Arc::clone(&clock))) as Box<dyn SignalSource>]
        } else {
            sources
        };

        let entries: Vec<ChainEntry> = sources
            .into_iter()
            .map(|source| {
                let usable = match source.validate() {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(signal = %kind, source = %source.name(), error = %e, "Source misconfigured, skipping");
                        false
                    }
                };
                ChainEntry { source, usable }
            })
            .collect();
        let has_simulated = entries.iter().any(|e| e.source.is_simulated());

        FallbackChain {
            kind,
            entries,
            has_simulated,
            fetch_timeout,
            clock,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Names of sources still eligible, in order
    pub fn active_sources(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.usable)
            .map(|e| e.source.name())
            .collect()
    }

    /// Try each usable source in order
    pub async fn fetch(&mut self) -> Result<RawSample, ChainError> {
        let mut attempted = 0;
        for entry in self.entries.iter_mut().filter(|e| e.usable) {
            attempted += 1;
            let name = entry.source.name().to_string();
            match guarded_fetch(entry.source.as_mut(), self.fetch_timeout).await {
                Ok(sample) => {
                    debug!(signal = %self.kind, source = %name, value = sample.value, "Fetched sample");
                    return Ok(sample);
                }
                Err(e) => {
                    warn!(signal = %self.kind, source = %name, error = %e, "Source failed, trying next");
                    if !e.is_retryable() {
                        entry.usable = false;
                    }
                }
            }
        }

        if !self.has_simulated {
            attempted += 1;
            warn!(signal = %self.kind, "All sources failed, falling back to simulated data");
            let mut last_resort = SimulatedSource::new(self.kind, Arc::clone(&self.clock));
            match guarded_fetch(&mut last_resort, self.fetch_timeout).await {
                Ok(sample) => return Ok(sample),
                Err(e) => warn!(signal = %self.kind, error = %e, "Simulated fallback failed"),
            }
        }

        Err(ChainError::Exhausted {
            kind: self.kind,
            attempted,
        })
    }
}

async fn guarded_fetch(
    source: &mut dyn SignalSource,
    timeout: Duration,
) -> Result<RawSample, SourceError> {
    match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Unavailable(format!(
            "no response within {}ms",
            timeout.as_millis()
        ))),
    }
}
