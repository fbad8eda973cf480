use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use flowstate_core::{
    CalibrationConfig, NotificationFilter, NotificationKind, NotificationWindow, RawSample,
    SignalKind, Timestamp, window_span,
};
use flowstate_ports::{Clock, SignalSource, SourceResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ACTIVITY_SOURCE: &str = "activity";

const MIN_GAP_SECS: i64 = 5;
const MAX_GAP_SECS: i64 = 15;
const MAX_BURST: u32 = 3;

/// Notification rate from simulated desktop activity
///
/// Bursts of 0-3 events arrive every 5-15 seconds of elapsed clock time and
/// land in a rolling [`NotificationWindow`]; each fetch reports the windowed
/// count on the 0-5 scale.
pub struct ActivitySource {
    window: NotificationWindow,
    calibration: CalibrationConfig,
    next_burst: Option<Timestamp>,
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl ActivitySource {
    pub fn new(
        filter: NotificationFilter,
        calibration: CalibrationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_rng(filter, calibration, clock, StdRng::from_entropy())
    }

    pub fn with_seed(
        filter: NotificationFilter,
        calibration: CalibrationConfig,
        clock: Arc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self::with_rng(filter, calibration, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        filter: NotificationFilter,
        calibration: CalibrationConfig,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        ActivitySource {
            window: NotificationWindow::new(calibration.window_secs, filter),
            calibration,
            next_burst: None,
            rng,
            clock,
        }
    }

    fn gap(&mut self) -> Duration {
        Duration::seconds(self.rng.gen_range(MIN_GAP_SECS..=MAX_GAP_SECS))
    }

    /// Generate every burst due up to `now`
    fn catch_up(&mut self, now: Timestamp) {
        let window_start = now.checked_sub_signed(window_span(self.calibration.window_secs));
        let mut next = match self.next_burst {
            Some(at) => at,
            None => now + self.gap(),
        };
        // Bursts older than the window would be pruned immediately.
        if let Some(start) = window_start {
            if next < start {
                next = start;
            }
        }
        while next <= now {
            let burst = self.rng.gen_range(0..=MAX_BURST);
            for _ in 0..burst {
                let kind = if self.rng.gen_bool(0.5) {
                    NotificationKind::App
                } else {
                    NotificationKind::System
                };
                self.window.record(kind, next);
            }
            next += self.gap();
        }
        self.next_burst = Some(next);
    }
}

#[async_trait]
impl SignalSource for ActivitySource {
    fn name(&self) -> &str {
        ACTIVITY_SOURCE
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Notifications
    }

    fn is_simulated(&self) -> bool {
        true
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        let now = self.clock.now();
        self.catch_up(now);
        let value = self.window.normalized(now, &self.calibration);
        Ok(RawSample::new(value, ACTIVITY_SOURCE, now))
    }
}
