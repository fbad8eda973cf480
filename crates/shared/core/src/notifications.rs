//! Rolling notification window
//!
//! Keeps timestamps of recent notification events, drops anything older than
//! the window, and reports the count of what remains. Events can be filtered
//! by kind so that app or system notifications are ignored.

use std::collections::VecDeque;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::values::Timestamp;

/// Where a notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    App,
    System,
}

/// Which notification kinds are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFilter {
    #[serde(default = "default_true")]
    pub count_app: bool,
    #[serde(default = "default_true")]
    pub count_system: bool,
}

impl Default for NotificationFilter {
    fn default() -> Self {
        NotificationFilter {
            count_app: true,
            count_system: true,
        }
    }
}

impl NotificationFilter {
    pub fn accepts(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::App => self.count_app,
            NotificationKind::System => self.count_system,
        }
    }
}

/// Time-bounded notification counter
#[derive(Debug, Clone)]
pub struct NotificationWindow {
    span: Duration,
    filter: NotificationFilter,
    events: VecDeque<Timestamp>,
}

impl NotificationWindow {
    pub fn new(window_secs: u64, filter: NotificationFilter) -> Self {
        NotificationWindow {
            span: window_span(window_secs),
            filter,
            events: VecDeque::new(),
        }
    }

    /// Record an event. Returns false when the filter rejects it.
    pub fn record(&mut self, kind: NotificationKind, at: Timestamp) -> bool {
        if !self.filter.accepts(kind) {
            return false;
        }
        // Events normally arrive in order; keep the deque sorted when they don't.
        let pos = self.events.partition_point(|t| *t <= at);
        self.events.insert(pos, at);
        true
    }

    /// Drop events older than the window relative to `now`
    pub fn prune(&mut self, now: Timestamp) {
        // A window reaching past the start of time keeps everything.
        let Some(cutoff) = now.checked_sub_signed(self.span) else {
            return;
        };
        while let Some(front) = self.events.front() {
            if *front < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of accepted events inside the window ending at `now`
    pub fn count(&mut self, now: Timestamp) -> usize {
        self.prune(now);
        self.events.iter().filter(|t| **t <= now).count()
    }

    /// Windowed count mapped to the 0-5 scale
    pub fn normalized(&mut self, now: Timestamp, calibration: &CalibrationConfig) -> f64 {
        let count = self.count(now);
        calibration.normalize_notifications(count as f64)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn filter(&self) -> NotificationFilter {
        self.filter
    }
}

/// Window length as a signed duration, saturating at `Duration::MAX`
pub fn window_span(window_secs: u64) -> Duration {
    i64::try_from(window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_events_inside_window() {
        let mut window = NotificationWindow::new(300, NotificationFilter::default());
        window.record(NotificationKind::App, t0());
        window.record(NotificationKind::System, t0() + Duration::seconds(10));

        assert_eq!(window.count(t0() + Duration::seconds(20)), 2);
    }

    #[test]
    fn test_old_events_expire() {
        let mut window = NotificationWindow::new(300, NotificationFilter::default());
        window.record(NotificationKind::App, t0());
        window.record(NotificationKind::App, t0() + Duration::seconds(200));

        assert_eq!(window.count(t0() + Duration::seconds(301)), 1);
        assert_eq!(window.count(t0() + Duration::seconds(600)), 0);
    }

    #[test]
    fn test_filter_rejects_system_events() {
        let filter = NotificationFilter {
            count_app: true,
            count_system: false,
        };
        let mut window = NotificationWindow::new(300, filter);

        assert!(window.record(NotificationKind::App, t0()));
        assert!(!window.record(NotificationKind::System, t0()));
        assert_eq!(window.count(t0()), 1);
    }

    #[test]
    fn test_out_of_order_events_stay_sorted() {
        let mut window = NotificationWindow::new(60, NotificationFilter::default());
        window.record(NotificationKind::App, t0() + Duration::seconds(50));
        window.record(NotificationKind::App, t0());

        assert_eq!(window.count(t0() + Duration::seconds(70)), 1);
    }

    #[test]
    fn test_normalized_saturates() {
        let calibration = CalibrationConfig::default();
        let mut window = NotificationWindow::new(300, NotificationFilter::default());
        for i in 0..30 {
            window.record(NotificationKind::App, t0() + Duration::seconds(i));
        }

        let now = t0() + Duration::seconds(30);
        assert_eq!(window.normalized(now, &calibration), 5.0);

        window.clear();
        assert_eq!(window.normalized(now, &calibration), 0.0);
    }

    #[test]
    fn test_normalized_midscale() {
        let calibration = CalibrationConfig::default();
        let mut window = NotificationWindow::new(300, NotificationFilter::default());
        for i in 0..10 {
            window.record(NotificationKind::System, t0() + Duration::seconds(i));
        }

        assert_eq!(window.normalized(t0() + Duration::seconds(10), &calibration), 2.5);
    }

    #[test]
    fn test_huge_window_keeps_every_event() {
        for window_secs in [10_000_000_000_000, 10_000_000_000_000_000, u64::MAX] {
            let mut window = NotificationWindow::new(window_secs, NotificationFilter::default());
            window.record(NotificationKind::App, t0());
            window.record(NotificationKind::App, t0() + Duration::seconds(5));

            assert_eq!(window.count(t0() + Duration::days(365)), 2);
        }
    }

    #[test]
    fn test_window_span_saturates() {
        assert_eq!(window_span(300), Duration::seconds(300));
        assert_eq!(window_span(u64::MAX), Duration::MAX);
    }
}
