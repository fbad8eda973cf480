use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{SignalSource, SourceError, SourceResult};

use crate::config::ProviderConfig;

/// Garmin Health API placeholder
///
/// Garmin requires OAuth 1.0a signed requests, which this client does not
/// implement; a fully configured adapter reports `Unauthorized` on every
/// fetch so the chain moves on.
pub struct GarminSource {
    missing: Vec<&'static str>,
}

impl GarminSource {
    pub fn new(config: &ProviderConfig) -> Self {
        let fields = [
            ("consumer_key", &config.consumer_key),
            ("consumer_secret", &config.consumer_secret),
            ("access_token", &config.access_token),
            ("access_token_secret", &config.access_token_secret),
        ];
        let missing = fields
            .iter()
            .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        GarminSource { missing }
    }
}

#[async_trait]
impl SignalSource for GarminSource {
    fn name(&self) -> &str {
        "garmin"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Hrv
    }

    fn validate(&self) -> SourceResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(SourceError::ConfigurationInvalid(format!(
                "garmin requires {}",
                self.missing.join(", ")
            )))
        }
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        self.validate()?;
        Err(SourceError::Unauthorized(
            "OAuth 1.0a request signing is not supported".to_string(),
        ))
    }
}
