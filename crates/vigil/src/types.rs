use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::probe::Probe;

/// Caller-chosen identifier of a monitored service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Capability tag of a monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Web,
    Database,
    Tcp,
    Other,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Web => write!(f, "web"),
            ServiceKind::Database => write!(f, "database"),
            ServiceKind::Tcp => write!(f, "tcp"),
            ServiceKind::Other => write!(f, "other"),
        }
    }
}

/// Static configuration of a monitored service.
///
/// Immutable after creation; registering the same id again replaces the
/// whole descriptor rather than mutating it in place.
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Unique service identifier
    pub id: ServiceId,

    /// Capability tag (web, database, ...)
    pub kind: ServiceKind,

    /// How often the service should be checked
    pub interval: Duration,

    /// Upper bound on a single check execution
    pub timeout: Duration,

    /// The check capability invoked for this service
    pub probe: Arc<dyn Probe>,
}

impl ServiceDescriptor {
    pub fn new(
        id: impl Into<ServiceId>,
        kind: ServiceKind,
        interval: Duration,
        timeout: Duration,
        probe: Arc<dyn Probe>,
    ) -> Self {
        Self { id: id.into(), kind, interval, timeout, probe }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Outcome of one probe execution, normalized by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    /// Whether the probe judged the service healthy
    pub healthy: bool,

    /// Observed latency in milliseconds
    pub latency_ms: f64,

    /// Timestamp when the check completed
    pub observed_at: SystemTime,

    /// Error message (if the check failed or timed out)
    pub error_detail: Option<String>,
}

impl RawResult {
    /// Detail string the executor uses to mark a timed-out check.
    pub const TIMEOUT_DETAIL: &'static str = "timeout";

    /// A check that completed on its own, healthy or not.
    pub fn completed(healthy: bool, latency_ms: f64, detail: Option<String>) -> Self {
        Self { healthy, latency_ms, observed_at: SystemTime::now(), error_detail: detail }
    }

    /// A check whose probe signalled failure.
    pub fn failed(latency_ms: f64, cause: impl Into<String>) -> Self {
        Self {
            healthy: false,
            latency_ms,
            observed_at: SystemTime::now(),
            error_detail: Some(cause.into()),
        }
    }

    /// A check abandoned by the executor after its bounded wait expired.
    pub fn timed_out(latency_ms: f64) -> Self {
        Self {
            healthy: false,
            latency_ms,
            observed_at: SystemTime::now(),
            error_detail: Some(Self::TIMEOUT_DETAIL.to_string()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        !self.healthy && self.error_detail.as_deref() == Some(Self::TIMEOUT_DETAIL)
    }
}

/// Health state of a monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Unknown,
    Healthy,
    Down,
    Timeout,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Unknown => write!(f, "unknown"),
            ServiceState::Healthy => write!(f, "healthy"),
            ServiceState::Down => write!(f, "down"),
            ServiceState::Timeout => write!(f, "timeout"),
        }
    }
}

/// Current queryable state of a monitored service.
///
/// Records are replaced wholesale on every update, so a reader never sees
/// latency from one check paired with the state of another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub id: ServiceId,
    pub current_state: ServiceState,
    pub last_latency_ms: Option<f64>,
    pub last_checked_at: Option<SystemTime>,
    pub consecutive_failures: u32,
}

impl ServiceStatus {
    /// Status of a service that has not completed a check yet.
    pub(crate) fn unknown(id: ServiceId) -> Self {
        Self {
            id,
            current_state: ServiceState::Unknown,
            last_latency_ms: None,
            last_checked_at: None,
            consecutive_failures: 0,
        }
    }

    /// Fold one check result into the next status record.
    ///
    /// A healthy result resets the failure streak; a timeout or failure
    /// extends it.
    pub(crate) fn apply(&self, result: &RawResult) -> Self {
        let (current_state, consecutive_failures) = if result.healthy {
            (ServiceState::Healthy, 0)
        } else if result.is_timeout() {
            (ServiceState::Timeout, self.consecutive_failures.saturating_add(1))
        } else {
            (ServiceState::Down, self.consecutive_failures.saturating_add(1))
        };

        Self {
            id: self.id.clone(),
            current_state,
            last_latency_ms: Some(result.latency_ms),
            last_checked_at: Some(result.observed_at),
            consecutive_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_has_no_observations() {
        let status = ServiceStatus::unknown(ServiceId::from("svc"));

        assert_eq!(status.current_state, ServiceState::Unknown);
        assert_eq!(status.last_latency_ms, None);
        assert_eq!(status.last_checked_at, None);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[test]
    fn failure_streak_increments_and_resets_on_success() {
        let mut status = ServiceStatus::unknown(ServiceId::from("svc"));

        status = status.apply(&RawResult::failed(1.0, "connection refused"));
        assert_eq!(status.consecutive_failures, 1);
        status = status.apply(&RawResult::failed(1.0, "connection refused"));
        assert_eq!(status.consecutive_failures, 2);
        status = status.apply(&RawResult::timed_out(20.0));
        assert_eq!(status.consecutive_failures, 3);

        status = status.apply(&RawResult::completed(true, 5.0, None));
        assert_eq!(status.current_state, ServiceState::Healthy);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[test]
    fn timeout_results_map_to_the_timeout_state() {
        let status = ServiceStatus::unknown(ServiceId::from("svc"))
            .apply(&RawResult::timed_out(250.0));

        assert_eq!(status.current_state, ServiceState::Timeout);
        assert_eq!(status.last_latency_ms, Some(250.0));
    }

    #[test]
    fn non_timeout_failures_map_to_down() {
        let result = RawResult::failed(3.0, "HTTP status 503");
        assert!(!result.is_timeout());

        let status = ServiceStatus::unknown(ServiceId::from("svc")).apply(&result);
        assert_eq!(status.current_state, ServiceState::Down);
    }

    #[test]
    fn unhealthy_report_without_detail_is_down_not_timeout() {
        let result = RawResult::completed(false, 3.0, None);

        assert!(!result.is_timeout());
        let status = ServiceStatus::unknown(ServiceId::from("svc")).apply(&result);
        assert_eq!(status.current_state, ServiceState::Down);
    }

    #[test]
    fn states_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&ServiceState::Healthy).unwrap(), "\"healthy\"");
        assert_eq!(serde_json::to_string(&ServiceState::Timeout).unwrap(), "\"timeout\"");
        assert_eq!(serde_json::to_string(&ServiceKind::Database).unwrap(), "\"database\"");
        assert_eq!(ServiceState::Down.to_string(), "down");
    }
}
