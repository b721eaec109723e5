use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RegisterError;
use crate::store::StatusStore;
use crate::types::{RawResult, ServiceDescriptor, ServiceId};
use crate::validation;

struct Registration {
    descriptor: Arc<ServiceDescriptor>,
    epoch: u64,
}

/// Mutable catalog of monitored services.
///
/// Each registration carries an epoch so that results produced by a check
/// dispatched under an older registration of the same id can be recognized
/// and discarded. Status rows in the store are created, reset and removed
/// together with their registration, under the registry's write lock.
pub struct ServiceRegistry {
    services: RwLock<HashMap<ServiceId, Registration>>,
    store: Arc<StatusStore>,
    next_epoch: AtomicU64,
}

impl ServiceRegistry {
    pub(crate) fn new(store: Arc<StatusStore>) -> Self {
        Self { services: RwLock::new(HashMap::new()), store, next_epoch: AtomicU64::new(1) }
    }

    /// Register a service after validating its descriptor.
    ///
    /// A duplicate id atomically replaces the prior descriptor and resets
    /// its status to `Unknown`; a policy change never keeps stale status.
    pub async fn register(&self, descriptor: ServiceDescriptor) -> Result<(), RegisterError> {
        validation::validate_descriptor(&descriptor)?;

        let id = descriptor.id.clone();
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);

        let mut services = self.services.write().await;
        let replaced = services
            .insert(id.clone(), Registration { descriptor: Arc::new(descriptor), epoch })
            .is_some();
        self.store.reset(&id).await;

        if replaced {
            debug!(service = %id, "replaced existing registration");
        } else {
            debug!(service = %id, "registered service");
        }
        Ok(())
    }

    /// Remove a service and its status together. No-op when absent.
    pub async fn deregister(&self, id: &ServiceId) {
        let mut services = self.services.write().await;
        if services.remove(id).is_some() {
            self.store.remove(id).await;
            debug!(service = %id, "deregistered service");
        }
    }

    pub async fn get(&self, id: &ServiceId) -> Option<Arc<ServiceDescriptor>> {
        self.services.read().await.get(id).map(|r| r.descriptor.clone())
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.services.read().await.is_empty()
    }

    /// All current registrations with their epochs, for the scheduler scan.
    pub(crate) async fn entries(&self) -> Vec<(Arc<ServiceDescriptor>, u64)> {
        self.services.read().await.values().map(|r| (r.descriptor.clone(), r.epoch)).collect()
    }

    /// Record a completed check if, and only if, it belongs to the current
    /// registration of the service. Returns whether the result was kept.
    pub(crate) async fn record_if_current(
        &self,
        id: &ServiceId,
        epoch: u64,
        result: &RawResult,
    ) -> bool {
        let services = self.services.read().await;
        match services.get(id) {
            Some(registration) if registration.epoch == epoch => {
                self.store.record(id, result).await;
                true
            }
            _ => false,
        }
    }
}
