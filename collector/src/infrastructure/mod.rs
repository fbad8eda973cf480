pub mod cache_store;
pub mod registry;
pub mod rest_client;
pub mod sink;
pub mod sources;

pub use cache_store::CacheFileStore;
pub use registry::{SourceConstructor, SourceContext, SourceEnv, SourceRegistry};
pub use rest_client::{RestClient, RestError};
pub use sink::HttpSink;
pub use sources::{
    ActivitySource, FitbitSource, GarminSource, HealthKitSource, HttpJsonSource, OuraSource,
    SimulatedSource, SimulationProfile,
};
