use thiserror::Error;

use crate::types::ServiceId;

/// Rejection of an invalid descriptor at registration time.
///
/// These are the only errors the engine reports synchronously to callers;
/// probe failures and timeouts are data, not errors.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("service id must not be empty")]
    EmptyId,
    #[error("check interval must be greater than zero for service {id}")]
    ZeroInterval { id: ServiceId },
    #[error("check timeout must be greater than zero for service {id}")]
    ZeroTimeout { id: ServiceId },
}

/// Lifecycle errors of the monitor facade.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor is already running")]
    AlreadyRunning,
    #[error("max concurrency must be greater than zero")]
    InvalidConcurrency,
}
