//! Shared probe stubs for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use vigil::{Probe, ProbeReport, ServiceDescriptor, ServiceId, ServiceKind};

pub fn descriptor(
    id: &str,
    kind: ServiceKind,
    interval: Duration,
    timeout: Duration,
    probe: Arc<dyn Probe>,
) -> ServiceDescriptor {
    ServiceDescriptor::new(ServiceId::from(id), kind, interval, timeout, probe)
}

pub struct AlwaysHealthy {
    pub latency_ms: f64,
}

#[async_trait::async_trait]
impl Probe for AlwaysHealthy {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> anyhow::Result<ProbeReport> {
        Ok(ProbeReport::healthy(self.latency_ms))
    }
}

pub struct AlwaysFailing;

#[async_trait::async_trait]
impl Probe for AlwaysFailing {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> anyhow::Result<ProbeReport> {
        Err(anyhow!("connection refused"))
    }
}

/// Never completes; only the executor's bounded wait ends it.
pub struct NeverReturns;

#[async_trait::async_trait]
impl Probe for NeverReturns {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> anyhow::Result<ProbeReport> {
        std::future::pending().await
    }
}

/// Tracks how many checks run at once and how many completed in total.
#[derive(Default)]
pub struct Gauge {
    active: AtomicUsize,
    max_active: AtomicUsize,
    runs: AtomicUsize,
}

impl Gauge {
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

/// Healthy probe that takes a fixed amount of time, instrumented through a
/// shared [`Gauge`].
pub struct SlowHealthy {
    pub delay: Duration,
    pub gauge: Arc<Gauge>,
}

#[async_trait::async_trait]
impl Probe for SlowHealthy {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> anyhow::Result<ProbeReport> {
        let active = self.gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.max_active.fetch_max(active, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
        self.gauge.runs.fetch_add(1, Ordering::SeqCst);
        Ok(ProbeReport::healthy(self.delay.as_secs_f64() * 1000.0))
    }
}
