use std::sync::Arc;

use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{Clock, SignalSource, SourceError, SourceResult};
use tracing::debug;

use crate::infrastructure::rest_client::{RestClient, read_number};

pub const OURA_API_URL: &str = "https://api.ouraring.com";

/// Sleep-period HRV from the Oura v2 API
pub struct OuraSource {
    client: RestClient,
    base_url: String,
    access_token: Option<String>,
    clock: Arc<dyn Clock>,
}

impl OuraSource {
    pub fn new(
        client: RestClient,
        base_url: Option<String>,
        access_token: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        OuraSource {
            client,
            base_url: base_url
                .unwrap_or_else(|| OURA_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            clock,
        }
    }
}

#[async_trait]
impl SignalSource for OuraSource {
    fn name(&self) -> &str {
        "oura"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Hrv
    }

    fn validate(&self) -> SourceResult<()> {
        match self.access_token {
            Some(_) => Ok(()),
            None => Err(SourceError::ConfigurationInvalid(
                "oura requires an access_token".to_string(),
            )),
        }
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(SourceError::ConfigurationInvalid(
                "oura requires an access_token".to_string(),
            ));
        };
        let today = self.clock.now().format("%Y-%m-%d").to_string();
        let url = format!("{}/v2/usercollection/sleep", self.base_url);
        debug!(url = %url, date = %today, "Requesting Oura sleep HRV");

        let query = [("start_date", today.clone()), ("end_date", today)];
        let body = self.client.get_json(&url, Some(token), &query).await?;
        let value = read_number(&body, "/data/0/heart_rate/average")?;
        Ok(RawSample::new(value, "oura", self.clock.now()))
    }
}
