//! Focus quality scoring
//!
//! Maps the three current signal values to a bounded 0-100 composite:
//!
//! ```text
//! hrv_component          = clamp01((hrv - hrv_floor) / hrv_span)           * hrv_weight
//! notification_component = (1 - clamp01(notifications / max_notifications)) * notification_weight
//! noise_component        = (1 - clamp01(noise / max_noise))                 * noise_weight
//! score                  = clamp(sum, 0, 100)
//! ```
//!
//! Each ratio is clamped before weighting so that out-of-range inputs
//! saturate their own component instead of borrowing from the others.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the composite score
pub const MIN_SCORE: f64 = 0.0;
/// Upper bound of the composite score
pub const MAX_SCORE: f64 = 100.0;

/// Normalization thresholds and component weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// HRV at or below this contributes nothing
    #[serde(default = "default_hrv_floor")]
    pub hrv_floor: f64,
    /// HRV at `hrv_floor + hrv_span` or above contributes the full weight
    #[serde(default = "default_hrv_span")]
    pub hrv_span: f64,
    /// Notification level that removes the whole notification component
    #[serde(default = "default_max_notifications")]
    pub max_notifications: f64,
    /// Noise level that removes the whole noise component
    #[serde(default = "default_max_noise")]
    pub max_noise: f64,
    #[serde(default = "default_hrv_weight")]
    pub hrv_weight: f64,
    #[serde(default = "default_notification_weight")]
    pub notification_weight: f64,
    #[serde(default = "default_noise_weight")]
    pub noise_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            hrv_floor: default_hrv_floor(),
            hrv_span: default_hrv_span(),
            max_notifications: default_max_notifications(),
            max_noise: default_max_noise(),
            hrv_weight: default_hrv_weight(),
            notification_weight: default_notification_weight(),
            noise_weight: default_noise_weight(),
        }
    }
}

/// Tolerance on the weight sum
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

impl ScoringConfig {
    /// Check that the weights and thresholds keep the score monotonic and
    /// reach 100 only at the optimum.
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("hrv_weight", self.hrv_weight),
            ("notification_weight", self.notification_weight),
            ("noise_weight", self.noise_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {weight}"));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - MAX_SCORE).abs() > WEIGHT_SUM_EPSILON {
            return Err(format!("weights must sum to {MAX_SCORE}, got {sum}"));
        }

        if !self.hrv_floor.is_finite() {
            return Err(format!("hrv_floor must be finite, got {}", self.hrv_floor));
        }
        let spans = [
            ("hrv_span", self.hrv_span),
            ("max_notifications", self.max_notifications),
            ("max_noise", self.max_noise),
        ];
        for (name, value) in spans {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be greater than zero, got {value}"));
            }
        }
        Ok(())
    }

    /// Score three readings with this configuration
    pub fn score(&self, hrv: f64, notifications: f64, noise: f64) -> FocusScore {
        let hrv_component = clamp01((hrv - self.hrv_floor) / self.hrv_span) * self.hrv_weight;
        let notification_component =
            (1.0 - clamp01(notifications / self.max_notifications)) * self.notification_weight;
        let noise_component = (1.0 - clamp01(noise / self.max_noise)) * self.noise_weight;

        let total = hrv_component + notification_component + noise_component;
        FocusScore(total.max(MIN_SCORE).min(MAX_SCORE))
    }
}

/// Score with the default thresholds and weights
pub fn score(hrv: f64, notifications: f64, noise: f64) -> f64 {
    ScoringConfig::default().score(hrv, notifications, noise).value()
}

/// Clamp to [0, 1]. NaN maps to 0.
fn clamp01(x: f64) -> f64 {
    x.max(0.0).min(1.0)
}

/// Composite focus quality score in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct FocusScore(f64);

impl FocusScore {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FocusScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

fn default_hrv_floor() -> f64 {
    40.0
}

fn default_hrv_span() -> f64 {
    60.0
}

fn default_max_notifications() -> f64 {
    5.0
}

fn default_max_noise() -> f64 {
    10.0
}

fn default_hrv_weight() -> f64 {
    50.0
}

fn default_notification_weight() -> f64 {
    30.0
}

fn default_noise_weight() -> f64 {
    20.0
}
