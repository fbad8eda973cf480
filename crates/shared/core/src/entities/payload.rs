use serde::{Deserialize, Serialize};

/// Body posted to the downstream sink.
///
/// Field names are the sink's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPayload {
    pub hrv_rmssd: f64,
    pub notification_count: f64,
    pub ambient_noise: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_score: Option<f64>,
}

impl FocusPayload {
    pub fn new(hrv_rmssd: f64, notification_count: f64, ambient_noise: f64) -> Self {
        FocusPayload {
            hrv_rmssd,
            notification_count,
            ambient_noise,
            focus_score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.focus_score = Some(score);
        self
    }
}
