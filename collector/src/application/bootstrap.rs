use std::sync::Arc;

use flowstate_ports::{Clock, FocusSink};
use tracing::info;

use super::aggregate::AggregateState;
use super::cache::SampleCache;
use super::collector::SignalCollector;
use super::fallback::FallbackChain;
use super::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::config::{CollectorConfigFile, ConfigError};
use crate::infrastructure::{CacheFileStore, RestClient, SourceEnv, SourceRegistry};

impl From<&CollectorConfigFile> for OrchestratorConfig {
    fn from(config: &CollectorConfigFile) -> Self {
        OrchestratorConfig {
            send_interval: config.send_interval(),
            startup_delay: config.startup_delay(),
            shutdown_timeout: config.shutdown_timeout(),
            include_score: config.include_score,
            scoring: config.scoring,
        }
    }
}

/// Wire every enabled collector from configuration
pub fn build_orchestrator(
    config: &CollectorConfigFile,
    registry: &SourceRegistry,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn FocusSink>,
) -> Result<Orchestrator, ConfigError> {
    config.validate()?;

    let client = RestClient::new(config.request_timeout())
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
    let env = SourceEnv {
        providers: config.providers.clone(),
        client,
        calibration: config.calibration,
        clock: Arc::clone(&clock),
    };

    let state = Arc::new(AggregateState::new(Arc::clone(&clock)));
    let mut orchestrator = Orchestrator::new(config.into(), Arc::clone(&state), sink);

    for (kind, collector_config) in config.enabled_collectors() {
        let settings =
            collector_config.to_settings(kind, config.retry_backoff(), config.request_timeout());
        let sources = registry.build_all(kind, &collector_config.sources, &env);
        let chain = FallbackChain::new(kind, sources, settings.fetch_timeout, Arc::clone(&clock));

        let mut cache = SampleCache::new(kind, settings.cache_ttl, Arc::clone(&clock));
        if let Some(path) = &settings.cache_path {
            cache = cache.with_store(Box::new(CacheFileStore::new(path)));
        }

        info!(
            signal = %kind,
            sources = ?chain.active_sources(),
            interval_secs = settings.interval.as_secs(),
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            "Collector configured"
        );
        orchestrator.add_collector(SignalCollector::new(
            settings,
            chain,
            cache,
            Arc::clone(&state),
        ));
    }

    Ok(orchestrator)
}
