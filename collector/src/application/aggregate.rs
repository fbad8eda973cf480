//! Latest value and health for every signal
//!
//! Each signal has its own lock, so collectors never contend with each other.
//! `snapshot` takes all three locks in canonical [`SignalKind::ALL`] order and
//! so observes a consistent triple.

use std::collections::BTreeMap;
use std::sync::Arc;

use flowstate_core::{FocusPayload, ScoringConfig, SignalKind, SignalStatus, Timestamp};
use flowstate_ports::Clock;
use parking_lot::Mutex;
use serde::Serialize;

/// Per-signal state as published by its collector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalState {
    pub current_value: f64,
    pub last_update: Option<Timestamp>,
    pub status: SignalStatus,
}

impl SignalState {
    fn initial(kind: SignalKind) -> Self {
        SignalState {
            current_value: kind.default_value(),
            last_update: None,
            status: SignalStatus::NotStarted,
        }
    }
}

/// Consistent view of all three current values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub hrv: f64,
    pub notifications: f64,
    pub noise: f64,
}

impl Snapshot {
    pub fn to_payload(&self) -> FocusPayload {
        FocusPayload::new(self.hrv, self.notifications, self.noise)
    }

    pub fn score(&self, scoring: &ScoringConfig) -> f64 {
        scoring
            .score(self.hrv, self.notifications, self.noise)
            .value()
    }
}

/// Status report entry, serialized with RFC 3339 timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub value: f64,
    pub last_update: Option<Timestamp>,
    pub status: SignalStatus,
}

pub type StatusReport = BTreeMap<SignalKind, SignalReport>;

pub struct AggregateState {
    slots: [Mutex<SignalState>; 3],
    clock: Arc<dyn Clock>,
}

impl AggregateState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        AggregateState {
            slots: SignalKind::ALL.map(|kind| Mutex::new(SignalState::initial(kind))),
            clock,
        }
    }

    fn slot(&self, kind: SignalKind) -> &Mutex<SignalState> {
        &self.slots[kind.index()]
    }

    /// Publish a fresh or cached value
    pub fn update(&self, kind: SignalKind, value: f64) {
        let now = self.clock.now();
        let mut state = self.slot(kind).lock();
        state.current_value = value;
        state.last_update = Some(now);
        state.status = SignalStatus::Active;
    }

    /// Record a failed cycle; the previous value is kept
    pub fn mark_failed(&self, kind: SignalKind) {
        self.slot(kind).lock().status = SignalStatus::Failed;
    }

    pub fn get(&self, kind: SignalKind) -> SignalState {
        *self.slot(kind).lock()
    }

    pub fn snapshot(&self) -> Snapshot {
        let hrv = self.slot(SignalKind::Hrv).lock();
        let notifications = self.slot(SignalKind::Notifications).lock();
        let noise = self.slot(SignalKind::Noise).lock();
        Snapshot {
            hrv: hrv.current_value,
            notifications: notifications.current_value,
            noise: noise.current_value,
        }
    }

    pub fn status_report(&self) -> StatusReport {
        SignalKind::ALL
            .into_iter()
            .map(|kind| {
                let state = self.get(kind);
                (
                    kind,
                    SignalReport {
                        value: state.current_value,
                        last_update: state.last_update,
                        status: state.status,
                    },
                )
            })
            .collect()
    }
}
