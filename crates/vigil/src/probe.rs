use std::time::Instant;

use anyhow::{Result, anyhow};
use tracing::debug;
use url::Url;

use crate::types::ServiceDescriptor;

/// Outcome reported by a probe that completed on its own.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Whether the probe judged the service healthy
    pub healthy: bool,

    /// Latency measured by the probe, in milliseconds
    pub latency_ms: f64,

    /// Optional explanation for an unhealthy report
    pub detail: Option<String>,
}

impl ProbeReport {
    pub fn healthy(latency_ms: f64) -> Self {
        Self { healthy: true, latency_ms, detail: None }
    }

    pub fn unhealthy(latency_ms: f64, detail: impl Into<String>) -> Self {
        Self { healthy: false, latency_ms, detail: Some(detail.into()) }
    }
}

/// The check capability a monitored service is registered with.
///
/// A probe either completes with a [`ProbeReport`] (healthy or not) or
/// signals failure by returning an error; the executor maps both, plus its
/// own timeout, into a uniform result. Implementations must not assume they
/// run to completion: a probe that exceeds the descriptor timeout is
/// dropped mid-flight.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<ProbeReport>;
}

/// HTTP/HTTPS probe
///
/// Reports healthy for 2xx/3xx responses, unhealthy (with the status code)
/// for other responses, and signals failure when the request itself fails.
pub struct HttpProbe {
    client: reqwest::Client,
    url: Url,
}

impl HttpProbe {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| anyhow!("invalid probe URL: {}", e))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(anyhow!("unsupported URL scheme: {}", other)),
        }

        Ok(Self { client: reqwest::Client::new(), url })
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<ProbeReport> {
        let start = Instant::now();

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        let latency_ms = elapsed_ms(start);
        let status = response.status();
        debug!(service = %descriptor.id, status = status.as_u16(), "HTTP probe completed");

        if status.is_success() || status.is_redirection() {
            Ok(ProbeReport::healthy(latency_ms))
        } else {
            Ok(ProbeReport::unhealthy(latency_ms, format!("HTTP status {}", status.as_u16())))
        }
    }
}

/// TCP connect probe
pub struct TcpProbe {
    addr: String,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait::async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<ProbeReport> {
        let start = Instant::now();

        tokio::net::TcpStream::connect(&self.addr)
            .await
            .map_err(|e| anyhow!("TCP connection failed: {}", e))?;

        let latency_ms = elapsed_ms(start);
        debug!(service = %descriptor.id, addr = %self.addr, "TCP probe completed");

        Ok(ProbeReport::healthy(latency_ms))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
