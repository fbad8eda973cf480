use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three signals that feed the focus score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Heart-rate variability (RMSSD, milliseconds)
    Hrv,
    /// Notification rate over the rolling window, normalized to 0-5
    Notifications,
    /// Ambient noise level, normalized to 0-10
    Noise,
}

impl SignalKind {
    /// All kinds in their canonical order.
    ///
    /// Any code that locks more than one kind at once must follow this order.
    pub const ALL: [SignalKind; 3] = [SignalKind::Hrv, SignalKind::Notifications, SignalKind::Noise];

    /// Stable index into per-kind arrays
    pub const fn index(self) -> usize {
        match self {
            SignalKind::Hrv => 0,
            SignalKind::Notifications => 1,
            SignalKind::Noise => 2,
        }
    }

    /// Config/status key
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Hrv => "hrv",
            SignalKind::Notifications => "notifications",
            SignalKind::Noise => "noise",
        }
    }

    /// Value a never-started or permanently failed signal reports.
    ///
    /// These are neutral midpoints so a missing signal does not drag the
    /// composite score toward either extreme.
    pub fn default_value(&self) -> f64 {
        match self {
            SignalKind::Hrv => 70.0,
            SignalKind::Notifications => 0.0,
            SignalKind::Noise => 5.0,
        }
    }

    /// Nominal valid range of a normalized reading
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            SignalKind::Hrv => (40.0, 100.0),
            SignalKind::Notifications => (0.0, 5.0),
            SignalKind::Noise => (0.0, 10.0),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hrv" => Ok(SignalKind::Hrv),
            "notifications" | "notification" => Ok(SignalKind::Notifications),
            "noise" => Ok(SignalKind::Noise),
            other => Err(format!("unknown signal kind: {}", other)),
        }
    }
}
