use async_trait::async_trait;
use flowstate_core::FocusPayload;

use crate::error::SinkResult;

/// Downstream consumer of aggregated readings
#[async_trait]
pub trait FocusSink: Send + Sync {
    /// Deliver one payload. A 2xx-equivalent acknowledgement is `Ok`.
    async fn dispatch(&self, payload: &FocusPayload) -> SinkResult<()>;

    fn name(&self) -> &str {
        "FocusSink"
    }
}
