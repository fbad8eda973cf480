use std::sync::Arc;

use async_trait::async_trait;
use flowstate_core::{CalibrationConfig, RawSample, SignalKind};
use flowstate_ports::{Clock, SignalSource, SourceError, SourceResult};
use tracing::debug;

use crate::config::{Normalization, ProviderConfig};
use crate::infrastructure::rest_client::{RestClient, read_number};

/// Generic JSON endpoint
///
/// Reads one number at `field` (a JSON pointer such as `/data/0/value`, or a
/// dotted path such as `data.0.value`) and optionally normalizes it.
pub struct HttpJsonSource {
    name: String,
    kind: SignalKind,
    client: RestClient,
    url: Option<String>,
    access_token: Option<String>,
    pointer: String,
    normalize: Option<Normalization>,
    calibration: CalibrationConfig,
    clock: Arc<dyn Clock>,
}

impl HttpJsonSource {
    pub fn new(
        name: impl Into<String>,
        kind: SignalKind,
        client: RestClient,
        config: &ProviderConfig,
        calibration: CalibrationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        HttpJsonSource {
            name: name.into(),
            kind,
            client,
            url: config.url.clone().filter(|u| !u.trim().is_empty()),
            access_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
            pointer: to_pointer(config.field.as_deref().unwrap_or("/value")),
            normalize: config.normalize,
            calibration,
            clock,
        }
    }

    fn apply_normalization(&self, raw: f64) -> f64 {
        match self.normalize {
            Some(Normalization::NoiseRms) => self.calibration.normalize_noise(raw),
            Some(Normalization::NotificationCount) => {
                self.calibration.normalize_notifications(raw)
            }
            None => raw,
        }
    }
}

/// Accept either a JSON pointer or a dotted path
fn to_pointer(field: &str) -> String {
    if field.is_empty() || field.starts_with('/') {
        field.to_string()
    } else {
        format!("/{}", field.replace('.', "/"))
    }
}

#[async_trait]
impl SignalSource for HttpJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn validate(&self) -> SourceResult<()> {
        let Some(url) = &self.url else {
            return Err(SourceError::ConfigurationInvalid(format!(
                "{} requires a url",
                self.name
            )));
        };
        url::Url::parse(url)
            .map(|_| ())
            .map_err(|e| SourceError::ConfigurationInvalid(format!("{}: {e}", self.name)))
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        self.validate()?;
        let Some(url) = self.url.as_deref() else {
            return Err(SourceError::ConfigurationInvalid(format!(
                "{} requires a url",
                self.name
            )));
        };
        debug!(source = %self.name, url = %url, "Requesting JSON value");

        let body = self
            .client
            .get_json(url, self.access_token.as_deref(), &[])
            .await?;
        let raw = read_number(&body, &self.pointer)?;
        Ok(RawSample::new(
            self.apply_normalization(raw),
            self.name.clone(),
            self.clock.now(),
        ))
    }
}
