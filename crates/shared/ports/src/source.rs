use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};

use crate::error::SourceResult;

/// One provider of raw samples for a single signal
///
/// Implementations perform at most one outbound call per `fetch` and report
/// every failure as a [`SourceError`](crate::SourceError); they never panic on
/// provider misbehaviour.
#[async_trait]
pub trait SignalSource: Send {
    /// Human-readable provider name used in logs and cache records
    fn name(&self) -> &str;

    /// Signal this source produces
    fn kind(&self) -> SignalKind;

    /// Result of checking the adapter's configuration at construction.
    ///
    /// A source that fails validation stays constructible; the fallback chain
    /// skips it at fetch time.
    fn validate(&self) -> SourceResult<()> {
        Ok(())
    }

    /// Whether this source synthesizes values locally
    fn is_simulated(&self) -> bool {
        false
    }

    /// Produce one sample
    async fn fetch(&mut self) -> SourceResult<RawSample>;
}
