use serde::{Deserialize, Serialize};

/// Health of one signal's collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// Collector has not published anything yet
    #[default]
    NotStarted,
    /// Last cycle published a value
    Active,
    /// Last cycle could not obtain a value; the previous reading is kept
    Failed,
}

impl SignalStatus {
    /// Returns true if the current value came from a live reading
    pub fn is_active(&self) -> bool {
        matches!(self, SignalStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::NotStarted => "not_started",
            SignalStatus::Active => "active",
            SignalStatus::Failed => "failed",
        }
    }
}
