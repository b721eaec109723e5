//! Descriptor validation at registration time.
//!
//! Configuration errors are the only errors reported synchronously to the
//! caller; everything else the engine normalizes into check results.

use tracing::warn;

use crate::error::RegisterError;
use crate::types::ServiceDescriptor;

/// Validate a descriptor before it enters the registry.
pub fn validate_descriptor(descriptor: &ServiceDescriptor) -> Result<(), RegisterError> {
    if descriptor.id.as_str().trim().is_empty() {
        return Err(RegisterError::EmptyId);
    }

    if descriptor.interval.is_zero() {
        return Err(RegisterError::ZeroInterval { id: descriptor.id.clone() });
    }

    if descriptor.timeout.is_zero() {
        return Err(RegisterError::ZeroTimeout { id: descriptor.id.clone() });
    }

    // Recommended, not required: a timeout at or above the interval means a
    // stuck check can consume the whole cadence.
    if descriptor.timeout >= descriptor.interval {
        warn!(
            service = %descriptor.id,
            "check timeout is not shorter than the check interval"
        );
    }

    Ok(())
}
