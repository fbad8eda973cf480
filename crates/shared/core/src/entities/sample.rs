use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// One acquisition result from a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub value: f64,
    pub source_name: String,
    pub acquired_at: Timestamp,
}

impl RawSample {
    pub fn new(value: f64, source_name: impl Into<String>, acquired_at: Timestamp) -> Self {
        RawSample {
            value,
            source_name: source_name.into(),
            acquired_at,
        }
    }
}
