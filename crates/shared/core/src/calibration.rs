//! Raw-measurement calibration
//!
//! Converts raw microphone amplitude and raw notification counts into the
//! normalized scales the scorer expects. The thresholds are calibration
//! guesses, so they are carried as configuration rather than constants.

use serde::{Deserialize, Serialize};

/// Calibration thresholds for raw measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// RMS at or below this is silence (0.0)
    #[serde(default = "default_min_rms")]
    pub min_rms: f64,
    /// RMS at or above this is very loud (10.0)
    #[serde(default = "default_max_rms")]
    pub max_rms: f64,
    /// Notifications per window that map to the top of the scale (5.0)
    #[serde(default = "default_max_notifications")]
    pub max_notifications_per_window: u32,
    /// Rolling notification window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            min_rms: default_min_rms(),
            max_rms: default_max_rms(),
            max_notifications_per_window: default_max_notifications(),
            window_secs: default_window_secs(),
        }
    }
}

/// Top of the normalized noise scale
pub const NOISE_SCALE: f64 = 10.0;
/// Top of the normalized notification scale
pub const NOTIFICATION_SCALE: f64 = 5.0;
/// Longest accepted notification window (one day)
pub const MAX_WINDOW_SECS: u64 = 86_400;

impl CalibrationConfig {
    /// Check the thresholds and the window length
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_WINDOW_SECS).contains(&self.window_secs) {
            return Err(format!(
                "window_secs must be between 1 and {MAX_WINDOW_SECS}, got {}",
                self.window_secs
            ));
        }
        if self.max_notifications_per_window == 0 {
            return Err("max_notifications_per_window must be greater than zero".to_string());
        }
        if !self.min_rms.is_finite() || !self.max_rms.is_finite() || self.min_rms >= self.max_rms {
            return Err(format!(
                "min_rms ({}) must be below max_rms ({})",
                self.min_rms, self.max_rms
            ));
        }
        Ok(())
    }

    /// Map an RMS amplitude to the 0-10 noise scale
    pub fn normalize_noise(&self, rms: f64) -> f64 {
        if rms <= self.min_rms {
            0.0
        } else if rms >= self.max_rms {
            NOISE_SCALE
        } else {
            round2((rms - self.min_rms) / (self.max_rms - self.min_rms) * NOISE_SCALE)
        }
    }

    /// Map a raw notification count to the 0-5 scale
    pub fn normalize_notifications(&self, count: f64) -> f64 {
        let max = self.max_notifications_per_window as f64;
        if count <= 0.0 {
            0.0
        } else if count >= max {
            NOTIFICATION_SCALE
        } else {
            round2(count / max * NOTIFICATION_SCALE)
        }
    }
}

/// Root-mean-square amplitude of a 16-bit PCM frame
pub fn rms(frame: &[i16]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn default_min_rms() -> f64 {
    100.0
}

fn default_max_rms() -> f64 {
    5000.0
}

fn default_max_notifications() -> u32 {
    20
}

fn default_window_secs() -> u64 {
    300
}
