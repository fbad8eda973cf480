//! Signal source adapters

mod activity;
mod fitbit;
mod garmin;
mod healthkit;
mod http_json;
mod oura;
mod simulated;

pub use activity::{ACTIVITY_SOURCE, ActivitySource};
pub use fitbit::{FITBIT_API_URL, FitbitSource};
pub use garmin::GarminSource;
pub use healthkit::HealthKitSource;
pub use http_json::HttpJsonSource;
pub use oura::{OURA_API_URL, OuraSource};
pub use simulated::{SIMULATED_SOURCE, SimulatedSource, SimulationProfile};
