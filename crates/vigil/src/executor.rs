use tokio::time::{Instant, timeout};
use tracing::debug;

use crate::types::{RawResult, ServiceDescriptor};

/// Runs a single health check with a bounded wait.
///
/// Every outcome is normalized into a [`RawResult`]: callers never
/// special-case a crashed probe against one that reported unhealthy. A
/// probe that exceeds the descriptor timeout is abandoned (its future is
/// dropped) and recorded as a timeout.
pub struct CheckExecutor;

impl CheckExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute one check for the given descriptor. Never fails outward.
    pub async fn execute(&self, descriptor: &ServiceDescriptor) -> RawResult {
        let started = Instant::now();

        match timeout(descriptor.timeout, descriptor.probe.probe(descriptor)).await {
            Ok(Ok(report)) => RawResult::completed(report.healthy, report.latency_ms, report.detail),
            Ok(Err(e)) => {
                debug!(service = %descriptor.id, error = %e, "probe signalled failure");
                RawResult::failed(elapsed_ms(started), e.to_string())
            }
            Err(_) => {
                debug!(
                    service = %descriptor.id,
                    timeout_ms = descriptor.timeout.as_millis() as u64,
                    "probe timed out and was abandoned"
                );
                RawResult::timed_out(elapsed_ms(started))
            }
        }
    }
}

impl Default for CheckExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
