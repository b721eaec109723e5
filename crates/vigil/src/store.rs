use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{RawResult, ServiceId, ServiceStatus};

/// Aggregates completed check results into the current status view.
///
/// Every update swaps in a freshly built record behind an `Arc`, so readers
/// only ever observe whole, internally consistent statuses. Snapshots clone
/// the `Arc`s and are never blocked by in-flight checks.
pub struct StatusStore {
    statuses: RwLock<BTreeMap<ServiceId, Arc<ServiceStatus>>>,
}

impl StatusStore {
    pub(crate) fn new() -> Self {
        Self { statuses: RwLock::new(BTreeMap::new()) }
    }

    /// Install a fresh `Unknown` status for a newly registered (or
    /// re-registered) service.
    pub(crate) async fn reset(&self, id: &ServiceId) {
        let mut statuses = self.statuses.write().await;
        statuses.insert(id.clone(), Arc::new(ServiceStatus::unknown(id.clone())));
    }

    /// Drop the status row together with its registration.
    pub(crate) async fn remove(&self, id: &ServiceId) {
        let mut statuses = self.statuses.write().await;
        statuses.remove(id);
    }

    /// Record one completed check as a whole-record replacement.
    ///
    /// Results for ids that are no longer tracked are discarded; a check
    /// that outlives its registration must not resurrect state.
    pub(crate) async fn record(&self, id: &ServiceId, result: &RawResult) {
        let mut statuses = self.statuses.write().await;
        let Some(current) = statuses.get(id) else {
            debug!(service = %id, "discarding result for an untracked service");
            return;
        };

        let next = current.apply(result);
        statuses.insert(id.clone(), Arc::new(next));
    }

    /// Current status of one service.
    pub async fn get(&self, id: &ServiceId) -> Option<Arc<ServiceStatus>> {
        self.statuses.read().await.get(id).cloned()
    }

    /// Consistent point-in-time view of all tracked statuses, ordered by id.
    pub async fn snapshot(&self) -> Vec<Arc<ServiceStatus>> {
        self.statuses.read().await.values().cloned().collect()
    }
}
