mod config;
mod probes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::time::interval;
use tracing::info;
use vigil::{HealthMonitor, HttpProbe, Probe, ServiceDescriptor, ServiceId, ServiceKind, TcpProbe};

use crate::config::{Config, ProbeKind, ServiceConfig};
use crate::probes::SimulatedProbe;

#[derive(Debug, Parser)]
#[command(name = "vigil-service", about = "Service health monitoring daemon", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the status report interval in seconds
    #[arg(long)]
    report_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let config = Config::from_config(args.config.as_deref())?;
    info!(services = config.services.len(), "loaded configuration");

    let monitor = HealthMonitor::new();
    for service in &config.services {
        let descriptor = build_descriptor(service)?;
        monitor
            .register(descriptor)
            .await
            .with_context(|| format!("failed to register service {}", service.id))?;
    }

    monitor.start(config.engine.max_concurrency).await?;

    let report_seconds = args.report_interval.unwrap_or(config.engine.report_interval_seconds);
    let mut report = interval(Duration::from_secs(report_seconds.max(1)));

    loop {
        tokio::select! {
            _ = report.tick() => report_statuses(&monitor).await,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    monitor.stop(Duration::from_millis(config.engine.stop_grace_ms)).await;
    Ok(())
}

fn build_descriptor(service: &ServiceConfig) -> Result<ServiceDescriptor> {
    let target = || {
        service
            .target
            .clone()
            .ok_or_else(|| anyhow!("service {} requires a target", service.id))
    };

    let (kind, probe): (ServiceKind, Arc<dyn Probe>) = match service.kind {
        ProbeKind::Web => (ServiceKind::Web, Arc::new(HttpProbe::new(&target()?)?)),
        ProbeKind::Database => (ServiceKind::Database, Arc::new(TcpProbe::new(target()?))),
        ProbeKind::Tcp => (ServiceKind::Tcp, Arc::new(TcpProbe::new(target()?))),
        ProbeKind::Simulated => (ServiceKind::Other, Arc::new(SimulatedProbe::new())),
    };

    Ok(ServiceDescriptor::new(
        ServiceId::new(&service.id),
        kind,
        Duration::from_millis(service.interval_ms),
        Duration::from_millis(service.timeout_ms),
        probe,
    ))
}

async fn report_statuses(monitor: &HealthMonitor) {
    for status in monitor.all_statuses().await {
        info!(
            service = %status.id,
            state = %status.current_state,
            latency_ms = ?status.last_latency_ms,
            failures = status.consecutive_failures,
            "service status"
        );
    }
}
