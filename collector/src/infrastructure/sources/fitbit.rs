use std::sync::Arc;

use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{Clock, SignalSource, SourceError, SourceResult};
use tracing::debug;

use crate::infrastructure::rest_client::{RestClient, read_number};

pub const FITBIT_API_URL: &str = "https://api.fitbit.com";

/// Daily RMSSD from the Fitbit Web API
pub struct FitbitSource {
    client: RestClient,
    base_url: String,
    access_token: Option<String>,
    clock: Arc<dyn Clock>,
}

impl FitbitSource {
    pub fn new(
        client: RestClient,
        base_url: Option<String>,
        access_token: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        FitbitSource {
            client,
            base_url: base_url
                .unwrap_or_else(|| FITBIT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            clock,
        }
    }
}

#[async_trait]
impl SignalSource for FitbitSource {
    fn name(&self) -> &str {
        "fitbit"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Hrv
    }

    fn validate(&self) -> SourceResult<()> {
        match self.access_token {
            Some(_) => Ok(()),
            None => Err(SourceError::ConfigurationInvalid(
                "fitbit requires an access_token".to_string(),
            )),
        }
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        let Some(token) = self.access_token.as_deref() else {
            return Err(SourceError::ConfigurationInvalid(
                "fitbit requires an access_token".to_string(),
            ));
        };
        let date = self.clock.now().format("%Y-%m-%d");
        let url = format!("{}/1/user/-/hrv/date/{}.json", self.base_url, date);
        debug!(url = %url, "Requesting Fitbit HRV");

        let body = self.client.get_json(&url, Some(token), &[]).await?;
        let value = read_number(&body, "/hrv/0/value/dailyRmssd")?;
        Ok(RawSample::new(value, "fitbit", self.clock.now()))
    }
}
