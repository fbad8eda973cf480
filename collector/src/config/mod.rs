mod loader;
mod types;

pub use loader::{ConfigError, load_config, load_config_from_str, load_default_config, save_config};
pub use types::{
    CollectorConfigFile, CollectorsConfig, Normalization, ProviderConfig, SignalCollectorConfig,
};
