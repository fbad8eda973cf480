use chrono::{Duration, Utc};
use flowstate_core::Timestamp;
use flowstate_ports::Clock;
use parking_lot::RwLock;
use std::sync::Arc;

/// Clock that only moves when told to
///
/// Cheap to clone; clones share the same time, so a test can hold one handle
/// and advance the time observed by every component holding another.
#[derive(Clone)]
pub struct ManualClock {
    current: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    /// Create a clock frozen at the current wall time
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move time forward. Negative durations are ignored; time never runs backwards.
    pub fn advance(&self, by: Duration) {
        if by < Duration::zero() {
            return;
        }
        let mut current = self.current.write();
        *current += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frozen_until_advanced() {
        let clock = ManualClock::starting_now();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance_secs(30);
        assert_eq!(clock.now() - t0, Duration::seconds(30));
    }

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::starting_now();
        let view = clock.clone();
        let t0 = view.now();

        clock.advance(Duration::milliseconds(1500));
        assert_eq!(view.now() - t0, Duration::milliseconds(1500));
    }

    #[test]
    fn test_never_runs_backwards() {
        let clock = ManualClock::starting_now();
        let t0 = clock.now();
        clock.advance_secs(-10);
        assert_eq!(clock.now(), t0);
    }
}
