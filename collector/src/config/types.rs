use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use flowstate_core::{CalibrationConfig, NotificationFilter, ScoringConfig, SignalKind};
use serde::{Deserialize, Serialize};

/// Root configuration for the collector service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfigFile {
    /// Base URL of the downstream service; payloads go to `{backend_url}/data`
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Seconds between two dispatches
    #[serde(default = "default_send_interval")]
    pub send_interval_secs: u64,
    /// Delay before the first dispatch so collectors can populate state
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u64,
    /// How long shutdown waits for each collector loop
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
    /// Per-request timeout for provider calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Per-request timeout for sink calls
    #[serde(default = "default_sink_timeout")]
    pub sink_timeout_ms: u64,
    /// Fixed backoff after a failed or panicked cycle
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
    /// Attach the computed focus score to every payload
    #[serde(default)]
    pub include_score: bool,
    #[serde(default)]
    pub collectors: CollectorsConfig,
    /// Provider credentials and endpoints, keyed by source name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

impl Default for CollectorConfigFile {
    fn default() -> Self {
        CollectorConfigFile {
            backend_url: default_backend_url(),
            send_interval_secs: default_send_interval(),
            startup_delay_ms: default_startup_delay(),
            shutdown_timeout_ms: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            sink_timeout_ms: default_sink_timeout(),
            retry_backoff_secs: default_retry_backoff(),
            include_score: false,
            collectors: CollectorsConfig::default(),
            providers: HashMap::new(),
            scoring: ScoringConfig::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl CollectorConfigFile {
    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.send_interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// One entry per signal kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorsConfig {
    #[serde(default)]
    pub hrv: SignalCollectorConfig,
    #[serde(default)]
    pub notifications: SignalCollectorConfig,
    #[serde(default)]
    pub noise: SignalCollectorConfig,
}

impl CollectorsConfig {
    pub fn get(&self, kind: SignalKind) -> &SignalCollectorConfig {
        match kind {
            SignalKind::Hrv => &self.hrv,
            SignalKind::Notifications => &self.notifications,
            SignalKind::Noise => &self.noise,
        }
    }
}

/// Collector configuration (JSON representation)
///
/// Fields left out fall back to per-kind defaults when resolved with
/// [`SignalCollectorConfig::to_settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalCollectorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    /// Ordered source names, tried first to last
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
}

impl Default for SignalCollectorConfig {
    fn default() -> Self {
        SignalCollectorConfig {
            enabled: true,
            interval_secs: None,
            sources: Vec::new(),
            cache_ttl_secs: None,
            persist_cache: None,
            cache_file: None,
        }
    }
}

impl SignalCollectorConfig {
    pub fn interval_secs(&self, kind: SignalKind) -> u64 {
        self.interval_secs.unwrap_or(match kind {
            SignalKind::Hrv => 60,
            SignalKind::Notifications | SignalKind::Noise => 5,
        })
    }

    pub fn cache_ttl_secs(&self, kind: SignalKind) -> u64 {
        self.cache_ttl_secs.unwrap_or(match kind {
            SignalKind::Hrv => 300,
            SignalKind::Notifications | SignalKind::Noise => self.interval_secs(kind),
        })
    }

    /// Path of the persisted cache, if this collector persists one
    pub fn cache_path(&self, kind: SignalKind) -> Option<PathBuf> {
        let persist = self.persist_cache.unwrap_or(kind == SignalKind::Hrv);
        if !persist {
            return None;
        }
        let file = self
            .cache_file
            .clone()
            .unwrap_or_else(|| format!("{}_cache.json", kind.as_str()));
        Some(PathBuf::from(file))
    }

    /// Convert to the application-layer settings for `kind`
    pub fn to_settings(
        &self,
        kind: SignalKind,
        retry_backoff: Duration,
        fetch_timeout: Duration,
    ) -> crate::application::CollectorSettings {
        crate::application::CollectorSettings {
            kind,
            interval: Duration::from_secs(self.interval_secs(kind)),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs(kind)),
            cache_path: self.cache_path(kind),
            retry_backoff,
            fetch_timeout,
        }
    }
}

/// Credentials and endpoint for one provider entry
///
/// The map key is the source name used in `collectors.*.sources`. When
/// `provider` is set, the entry configures an instance of that provider type
/// under a custom name (e.g. two `http` sources for different signals).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,
    /// Base URL override for vendor providers, full endpoint for `http`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// JSON pointer to the value in an `http` response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize: Option<Normalization>,
    /// Which notification kinds the `activity` provider counts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_filter: Option<NotificationFilter>,
}

impl ProviderConfig {
    /// Provider type this entry instantiates, defaulting to the entry name
    pub fn provider_type<'a>(&'a self, name: &'a str) -> &'a str {
        self.provider.as_deref().unwrap_or(name)
    }
}

/// Post-processing applied to a raw value read by the `http` provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw RMS amplitude mapped to the 0-10 noise scale
    NoiseRms,
    /// Raw windowed notification count mapped to the 0-5 scale
    NotificationCount,
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_send_interval() -> u64 {
    5
}

fn default_startup_delay() -> u64 {
    2000
}

fn default_shutdown_timeout() -> u64 {
    2000
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_sink_timeout() -> u64 {
    5000
}

fn default_retry_backoff() -> u64 {
    5
}
