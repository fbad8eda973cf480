use std::time::Duration;

use async_trait::async_trait;
use flowstate_core::FocusPayload;
use flowstate_ports::{FocusSink, SinkError, SinkResult};
use reqwest::Client;
use tracing::debug;

use crate::config::ConfigError;

/// Posts payloads as JSON to `{backend_url}/data`
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = format!("{}/data", backend_url.trim_end_matches('/'));
        url::Url::parse(&endpoint).map_err(|e| ConfigError::InvalidUrl {
            url: endpoint.clone(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(HttpSink { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(err: reqwest::Error) -> SinkError {
    if err.is_timeout() {
        SinkError::Timeout
    } else {
        SinkError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl FocusSink for HttpSink {
    async fn dispatch(&self, payload: &FocusPayload) -> SinkResult<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status.is_success() {
            debug!(endpoint = %self.endpoint, status = status.as_u16(), "Payload accepted");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        "HttpSink"
    }
}
