//! Per-collector sample cache
//!
//! Holds the most recent successful sample for one signal. A value younger
//! than the TTL is republished instead of fetching again. Optionally backed by
//! a [`CacheStore`] so a fresh value survives restarts.

use std::sync::Arc;
use std::time::Duration;

use flowstate_core::{RawSample, SignalKind, Timestamp};
use flowstate_ports::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Persisted form of a cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub value: f64,
    pub timestamp: Timestamp,
    pub source: String,
}

#[derive(Error, Debug)]
pub enum CacheStoreError {
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Durable storage for a single cache entry
pub trait CacheStore: Send + Sync {
    /// Stored record, `None` when nothing has been stored yet
    fn load(&self) -> Result<Option<CacheRecord>, CacheStoreError>;

    fn save(&self, record: &CacheRecord) -> Result<(), CacheStoreError>;

    /// Where the record lives, for logs
    fn location(&self) -> String;
}

pub struct SampleCache {
    kind: SignalKind,
    ttl: chrono::Duration,
    entry: Option<CacheRecord>,
    clock: Arc<dyn Clock>,
    store: Option<Box<dyn CacheStore>>,
}

impl SampleCache {
    pub fn new(kind: SignalKind, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        SampleCache {
            kind,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            entry: None,
            clock,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Load a persisted entry. Returns true if a usable one was found.
    ///
    /// Unreadable, unparseable or future-dated records are ignored.
    pub fn warm(&mut self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        let record = match store.load() {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!(signal = %self.kind, location = %store.location(), error = %e, "Ignoring unreadable cache file");
                return false;
            }
        };
        if record.timestamp > self.clock.now() {
            warn!(signal = %self.kind, location = %store.location(), "Ignoring future-dated cache entry");
            return false;
        }
        info!(
            signal = %self.kind,
            value = record.value,
            source = %record.source,
            "Loaded cached value"
        );
        self.entry = Some(record);
        true
    }

    /// True if there is no entry or the entry has reached the TTL
    pub fn should_refresh(&self) -> bool {
        match self.age() {
            None => true,
            Some(age) => age < chrono::Duration::zero() || age >= self.ttl,
        }
    }

    /// Cached sample, regardless of age
    pub fn get(&self) -> Option<RawSample> {
        self.entry
            .as_ref()
            .map(|e| RawSample::new(e.value, e.source.clone(), e.timestamp))
    }

    /// Store a fresh value stamped with the current time
    pub fn put(&mut self, value: f64, source_name: &str) {
        let record = CacheRecord {
            value,
            timestamp: self.clock.now(),
            source: source_name.to_string(),
        };
        if let Some(store) = &self.store {
            match store.save(&record) {
                Ok(()) => debug!(signal = %self.kind, location = %store.location(), "Cache persisted"),
                Err(e) => {
                    warn!(signal = %self.kind, location = %store.location(), error = %e, "Failed to persist cache")
                }
            }
        }
        self.entry = Some(record);
    }

    /// Age of the current entry
    pub fn age(&self) -> Option<chrono::Duration> {
        self.entry.as_ref().map(|e| self.clock.now() - e.timestamp)
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }
}
