//! Provider lookup keyed by (signal kind, provider type)
//!
//! Source names in `collectors.*.sources` are matched case-insensitively. A
//! name that has an entry in `providers` with an explicit `provider` field is
//! built as that provider type under the configured name.

use std::collections::HashMap;
use std::sync::Arc;

use flowstate_core::{CalibrationConfig, SignalKind};
use flowstate_ports::{Clock, SignalSource};
use tracing::{debug, warn};

use super::rest_client::RestClient;
use super::sources::{
    ActivitySource, FitbitSource, GarminSource, HealthKitSource, HttpJsonSource, OuraSource,
    SimulatedSource,
};
use crate::config::{ConfigError, ProviderConfig};

/// Everything a constructor may need
pub struct SourceContext<'a> {
    /// Configured source name
    pub name: &'a str,
    pub kind: SignalKind,
    pub provider: &'a ProviderConfig,
    pub client: &'a RestClient,
    pub calibration: CalibrationConfig,
    pub clock: Arc<dyn Clock>,
}

pub type SourceConstructor = fn(&SourceContext<'_>) -> Box<dyn SignalSource>;

/// Shared inputs for building every configured source
pub struct SourceEnv {
    pub providers: HashMap<String, ProviderConfig>,
    pub client: RestClient,
    pub calibration: CalibrationConfig,
    pub clock: Arc<dyn Clock>,
}

impl SourceEnv {
    fn provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, config)| config)
    }
}

pub struct SourceRegistry {
    constructors: HashMap<(SignalKind, String), SourceConstructor>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        SourceRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Registry with every built-in provider
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        for kind in SignalKind::ALL {
            registry.register(kind, "simulated", |ctx| {
                Box::new(SimulatedSource::new(ctx.kind, Arc::clone(&ctx.clock)))
            });
            registry.register(kind, "http", |ctx| {
                Box::new(HttpJsonSource::new(
                    ctx.name,
                    ctx.kind,
                    ctx.client.clone(),
                    ctx.provider,
                    ctx.calibration,
                    Arc::clone(&ctx.clock),
                ))
            });
        }

        registry.register(SignalKind::Hrv, "fitbit", |ctx| {
            Box::new(FitbitSource::new(
                ctx.client.clone(),
                ctx.provider.url.clone(),
                ctx.provider.access_token.clone(),
                Arc::clone(&ctx.clock),
            ))
        });
        registry.register(SignalKind::Hrv, "oura", |ctx| {
            Box::new(OuraSource::new(
                ctx.client.clone(),
                ctx.provider.url.clone(),
                ctx.provider.access_token.clone(),
                Arc::clone(&ctx.clock),
            ))
        });
        registry.register(SignalKind::Hrv, "garmin", |ctx| {
            Box::new(GarminSource::new(ctx.provider))
        });
        registry.register(SignalKind::Hrv, "apple_healthkit", |_| Box::new(HealthKitSource));
        registry.register(SignalKind::Hrv, "healthkit", |_| Box::new(HealthKitSource));

        registry.register(SignalKind::Notifications, "activity", |ctx| {
            Box::new(ActivitySource::new(
                ctx.provider.notification_filter.unwrap_or_default(),
                ctx.calibration,
                Arc::clone(&ctx.clock),
            ))
        });

        registry
    }

    pub fn register(&mut self, kind: SignalKind, provider_type: &str, ctor: SourceConstructor) {
        self.constructors
            .insert((kind, provider_type.to_ascii_lowercase()), ctor);
    }

    pub fn contains(&self, kind: SignalKind, provider_type: &str) -> bool {
        self.constructors
            .contains_key(&(kind, provider_type.to_ascii_lowercase()))
    }

    /// Provider types registered for `kind`, sorted
    pub fn providers(&self, kind: SignalKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .constructors
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Build one source by configured name
    pub fn build(
        &self,
        kind: SignalKind,
        name: &str,
        env: &SourceEnv,
    ) -> Result<Box<dyn SignalSource>, ConfigError> {
        let default_config = ProviderConfig::default();
        let provider = env.provider_config(name).unwrap_or(&default_config);
        let provider_type = provider.provider_type(name).to_ascii_lowercase();

        let ctor = self
            .constructors
            .get(&(kind, provider_type))
            .ok_or_else(|| ConfigError::UnknownProvider {
                kind,
                name: name.to_string(),
            })?;

        let ctx = SourceContext {
            name,
            kind,
            provider,
            client: &env.client,
            calibration: env.calibration,
            clock: Arc::clone(&env.clock),
        };
        Ok(ctor(&ctx))
    }

    /// Build every named source in order, logging and skipping unknown names
    pub fn build_all(
        &self,
        kind: SignalKind,
        names: &[String],
        env: &SourceEnv,
    ) -> Vec<Box<dyn SignalSource>> {
        names
            .iter()
            .filter_map(|name| match self.build(kind, name, env) {
                Ok(source) => {
                    debug!(signal = %kind, source = %source.name(), "Source configured");
                    Some(source)
                }
                Err(e) => {
                    warn!(
                        signal = %kind,
                        error = %e,
                        available = ?self.providers(kind),
                        "Skipping source"
                    );
                    None
                }
            })
            .collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
