use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{SignalSource, SourceError, SourceResult};

/// HealthKit data is only reachable from an on-device app.
pub struct HealthKitSource;

#[async_trait]
impl SignalSource for HealthKitSource {
    fn name(&self) -> &str {
        "apple_healthkit"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Hrv
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        Err(SourceError::Unavailable(
            "HealthKit requires a companion iOS app".to_string(),
        ))
    }
}
