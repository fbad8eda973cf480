use std::path::Path;

use flowstate_core::SignalKind;
use thiserror::Error;

use super::types::{CollectorConfigFile, SignalCollectorConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No enabled collectors in config")]
    NoEnabledCollectors,
    #[error("Unknown provider '{name}' for {kind}")]
    UnknownProvider { kind: SignalKind, name: String },
    #[error("Interval for {0} must be greater than zero")]
    InvalidInterval(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid scoring config: {0}")]
    InvalidScoring(String),
    #[error("Invalid calibration config: {0}")]
    InvalidCalibration(String),
}

/// Load collector configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CollectorConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: CollectorConfigFile = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<CollectorConfigFile, ConfigError> {
    let config: CollectorConfigFile = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<CollectorConfigFile, ConfigError> {
    let default_config = include_str!("collector_config.json");
    load_config_from_str(default_config)
}

/// Write configuration as pretty-printed JSON
pub fn save_config<P: AsRef<Path>>(config: &CollectorConfigFile, path: P) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

impl CollectorConfigFile {
    /// Enabled collectors in canonical signal order
    pub fn enabled_collectors(&self) -> Vec<(SignalKind, &SignalCollectorConfig)> {
        SignalKind::ALL
            .into_iter()
            .map(|kind| (kind, self.collectors.get(kind)))
            .filter(|(_, c)| c.enabled)
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled = self.enabled_collectors();
        if enabled.is_empty() {
            return Err(ConfigError::NoEnabledCollectors);
        }
        if self.send_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval("dispatch".to_string()));
        }
        for (kind, collector) in enabled {
            if collector.interval_secs(kind) == 0 {
                return Err(ConfigError::InvalidInterval(kind.to_string()));
            }
        }
        self.scoring.validate().map_err(ConfigError::InvalidScoring)?;
        self.calibration.validate().map_err(ConfigError::InvalidCalibration)?;
        url::Url::parse(&self.backend_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.backend_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
