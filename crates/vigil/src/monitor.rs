use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::{MonitorError, RegisterError};
use crate::executor::CheckExecutor;
use crate::registry::ServiceRegistry;
use crate::scheduler::DutyCycle;
use crate::store::StatusStore;
use crate::types::{ServiceDescriptor, ServiceId, ServiceStatus};

const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(25);

/// Composes registry, scheduler, executor and status store into a single
/// engine with a start/stop lifecycle and a query API.
///
/// Queries are always served from the status store, including while the
/// monitor is stopped; the last known state persists.
pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    store: Arc<StatusStore>,
    executor: Arc<CheckExecutor>,
    scan_interval: Duration,
    cycle: Mutex<Option<RunningCycle>>,
}

struct RunningCycle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::with_scan_interval(DEFAULT_SCAN_INTERVAL)
    }

    /// Create a monitor with a custom duty-cycle scan interval.
    ///
    /// The scan interval is the granularity at which Due services are
    /// noticed; it must be non-zero.
    pub fn with_scan_interval(scan_interval: Duration) -> Self {
        assert!(!scan_interval.is_zero(), "scan interval must be non-zero");

        let store = Arc::new(StatusStore::new());
        Self {
            registry: Arc::new(ServiceRegistry::new(store.clone())),
            store,
            executor: Arc::new(CheckExecutor::new()),
            scan_interval,
            cycle: Mutex::new(None),
        }
    }

    /// Register a service for monitoring; its first check is due
    /// immediately. A duplicate id replaces the prior registration.
    pub async fn register(&self, descriptor: ServiceDescriptor) -> Result<(), RegisterError> {
        self.registry.register(descriptor).await
    }

    /// Remove a service and its status. No-op when the id is absent; an
    /// in-flight check for it completes but its result is discarded.
    pub async fn deregister(&self, id: &ServiceId) {
        self.registry.deregister(id).await
    }

    /// Start the scheduler duty cycle with the given concurrency cap.
    pub async fn start(&self, max_concurrency: usize) -> Result<(), MonitorError> {
        if max_concurrency == 0 {
            return Err(MonitorError::InvalidConcurrency);
        }

        let mut cycle = self.cycle.lock().await;
        if let Some(running) = cycle.as_ref() {
            if !running.handle.is_finished() {
                return Err(MonitorError::AlreadyRunning);
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let duty_cycle = DutyCycle {
            registry: self.registry.clone(),
            executor: self.executor.clone(),
            scan_interval: self.scan_interval,
            max_concurrency,
        };
        let handle = tokio::spawn(duty_cycle.run(shutdown_rx));

        *cycle = Some(RunningCycle { shutdown_tx, handle });
        info!(max_concurrency, "health monitor started");
        Ok(())
    }

    /// Request cancellation and wait for the duty cycle to quiesce.
    ///
    /// No new checks are dispatched after this is called; in-flight checks
    /// finish within their own timeouts. If the grace timeout expires first
    /// the duty cycle is aborted and whatever is still in flight is
    /// abandoned. Never fails; a no-op when the monitor is not running.
    pub async fn stop(&self, grace: Duration) {
        let Some(running) = self.cycle.lock().await.take() else {
            return;
        };

        let _ = running.shutdown_tx.send(true);
        let mut handle = running.handle;

        match timeout(grace, &mut handle).await {
            Ok(Ok(())) => info!("health monitor stopped"),
            Ok(Err(e)) => warn!(error = %e, "duty cycle task failed during shutdown"),
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "grace timeout expired, abandoning in-flight checks"
                );
                handle.abort();
            }
        }
    }

    /// Current status of one service; `None` when the id is not registered.
    pub async fn status(&self, id: &ServiceId) -> Option<ServiceStatus> {
        self.store.get(id).await.map(|status| (*status).clone())
    }

    /// Statuses of all registered services, ordered by id.
    pub async fn all_statuses(&self) -> Vec<ServiceStatus> {
        self.store.snapshot().await.into_iter().map(|status| (*status).clone()).collect()
    }

    pub async fn is_running(&self) -> bool {
        self.cycle.lock().await.as_ref().is_some_and(|cycle| !cycle.handle.is_finished())
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
