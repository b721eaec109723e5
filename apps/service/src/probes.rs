use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use vigil::{Probe, ProbeReport, ServiceDescriptor};

/// Probe with no real target: flips a coin and reports a synthetic latency.
///
/// Useful for demo configs and for exercising the engine without any
/// reachable services.
pub struct SimulatedProbe {
    latency_range_ms: (f64, f64),
}

impl SimulatedProbe {
    pub fn new() -> Self {
        Self { latency_range_ms: (500.0, 2500.0) }
    }

    pub fn with_latency_range(low_ms: f64, high_ms: f64) -> Self {
        Self { latency_range_ms: (low_ms, high_ms) }
    }
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for SimulatedProbe {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> Result<ProbeReport> {
        let (low, high) = self.latency_range_ms;
        let mut rng = rand::thread_rng();
        let latency_ms = rng.gen_range(low..high);

        if rng.gen_bool(0.5) {
            Ok(ProbeReport::healthy(latency_ms))
        } else {
            Ok(ProbeReport::unhealthy(latency_ms, "simulated outage"))
        }
    }
}
