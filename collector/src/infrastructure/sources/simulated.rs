use std::sync::Arc;

use async_trait::async_trait;
use flowstate_core::{RawSample, SignalKind};
use flowstate_ports::{Clock, SignalSource, SourceError, SourceResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

pub const SIMULATED_SOURCE: &str = "simulated";

/// Bounds and distribution parameters for a simulated signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProfile {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Standard deviation of the step between consecutive values
    pub step_std_dev: f64,
    pub decimals: i32,
}

impl SimulationProfile {
    pub fn for_kind(kind: SignalKind) -> Self {
        let (min, max) = kind.valid_range();
        match kind {
            SignalKind::Hrv => SimulationProfile {
                min,
                max,
                mean: 70.0,
                std_dev: 15.0,
                step_std_dev: 3.0,
                decimals: 1,
            },
            SignalKind::Notifications => SimulationProfile {
                min,
                max,
                mean: 1.0,
                std_dev: 0.5,
                step_std_dev: 0.5,
                decimals: 2,
            },
            SignalKind::Noise => SimulationProfile {
                min,
                max,
                mean: 3.0,
                std_dev: 2.0,
                step_std_dev: 0.5,
                decimals: 2,
            },
        }
    }

    fn bound(&self, x: f64) -> f64 {
        let factor = 10f64.powi(self.decimals);
        let rounded = (x.clamp(self.min, self.max) * factor).round() / factor;
        rounded.clamp(self.min, self.max)
    }
}

/// Locally generated bounded random walk
pub struct SimulatedSource {
    kind: SignalKind,
    profile: SimulationProfile,
    last: Option<f64>,
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl SimulatedSource {
    pub fn new(kind: SignalKind, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(kind, clock, StdRng::from_entropy())
    }

    /// Deterministic sequence for tests
    pub fn with_seed(kind: SignalKind, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(kind, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kind: SignalKind, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        SimulatedSource {
            kind,
            profile: SimulationProfile::for_kind(kind),
            last: None,
            rng,
            clock,
        }
    }

    pub fn profile(&self) -> SimulationProfile {
        self.profile
    }

    fn next_value(&mut self) -> SourceResult<f64> {
        let (center, spread) = match self.last {
            None => (self.profile.mean, self.profile.std_dev),
            Some(prev) => (prev, self.profile.step_std_dev),
        };
        let normal = Normal::new(center, spread)
            .map_err(|e| SourceError::ConfigurationInvalid(e.to_string()))?;
        Ok(self.profile.bound(normal.sample(&mut self.rng)))
    }
}

#[async_trait]
impl SignalSource for SimulatedSource {
    fn name(&self) -> &str {
        SIMULATED_SOURCE
    }

    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn is_simulated(&self) -> bool {
        true
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        let value = self.next_value()?;
        self.last = Some(value);
        Ok(RawSample::new(value, SIMULATED_SOURCE, self.clock.now()))
    }
}
