use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::executor::CheckExecutor;
use crate::registry::ServiceRegistry;
use crate::types::{RawResult, ServiceId};

const COMPLETION_CHANNEL_CAPACITY: usize = 100;

struct Completion {
    id: ServiceId,
    epoch: u64,
    result: RawResult,
}

/// The scheduler's serialized scan/dispatch loop.
///
/// Each scan walks the registry, dispatches every Due service as its own
/// task (capped by the concurrency semaphore) and never re-dispatches a
/// service that is still Running. Completions flow back over a channel and
/// move the service to Idle with `last_completed = completion time`,
/// regardless of outcome; health failures do not change cadence.
pub(crate) struct DutyCycle {
    pub(crate) registry: Arc<ServiceRegistry>,
    pub(crate) executor: Arc<CheckExecutor>,
    pub(crate) scan_interval: Duration,
    pub(crate) max_concurrency: usize,
}

impl DutyCycle {
    /// Run until shutdown is signalled, then drain the in-flight checks.
    ///
    /// The drain is bounded by the per-check timeouts, so quiescence takes
    /// at most the largest registered timeout.
    pub(crate) async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(COMPLETION_CHANNEL_CAPACITY);

        let mut running: HashSet<ServiceId> = HashSet::new();
        let mut last_completed: HashMap<ServiceId, (u64, Instant)> = HashMap::new();

        let mut scan = tokio::time::interval(self.scan_interval);
        scan.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut accepting = true;

        loop {
            tokio::select! {
                _ = scan.tick(), if accepting => {
                    self.scan(&mut running, &mut last_completed, &semaphore, &done_tx).await;
                }

                Some(done) = done_rx.recv() => {
                    running.remove(&done.id);
                    last_completed.insert(done.id.clone(), (done.epoch, Instant::now()));

                    let kept = self.registry.record_if_current(&done.id, done.epoch, &done.result).await;
                    if !kept {
                        debug!(service = %done.id, "discarded result from a stale registration");
                    }

                    if !accepting && running.is_empty() {
                        break;
                    }
                }

                // Any wake-up here means stop: either the flag flipped or the
                // facade went away entirely.
                _ = shutdown.changed(), if accepting => {
                    accepting = false;
                    debug!(in_flight = running.len(), "duty cycle draining");
                    if running.is_empty() {
                        break;
                    }
                }
            }
        }

        debug!("duty cycle quiesced");
    }

    /// One scan/dispatch step. Safe to run repeatedly: a Running service is
    /// skipped, a not-yet-due service is left alone, and hitting the
    /// concurrency cap leaves the service Due for the next scan.
    async fn scan(
        &self,
        running: &mut HashSet<ServiceId>,
        last_completed: &mut HashMap<ServiceId, (u64, Instant)>,
        semaphore: &Arc<Semaphore>,
        done_tx: &mpsc::Sender<Completion>,
    ) {
        let now = Instant::now();
        let services = self.registry.entries().await;

        let registered: HashSet<ServiceId> = services.iter().map(|(d, _)| d.id.clone()).collect();
        last_completed.retain(|id, _| registered.contains(id));

        for (descriptor, epoch) in services {
            if running.contains(&descriptor.id) {
                continue;
            }

            let due = match last_completed.get(&descriptor.id) {
                Some((completed_epoch, at)) if *completed_epoch == epoch => {
                    now.duration_since(*at) >= descriptor.interval
                }
                // Never completed under this registration: due immediately.
                _ => true,
            };
            if !due {
                continue;
            }

            let Ok(permit) = Arc::clone(semaphore).try_acquire_owned() else {
                // Pool exhausted: the service stays Due and is retried on the
                // next scan. Not an error, nothing is dropped.
                trace!(service = %descriptor.id, "concurrency cap reached, dispatch deferred");
                continue;
            };

            running.insert(descriptor.id.clone());
            trace!(service = %descriptor.id, epoch, "dispatching check");

            let executor = Arc::clone(&self.executor);
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let result = executor.execute(&descriptor).await;
                drop(permit);

                let completion = Completion { id: descriptor.id.clone(), epoch, result };
                if done_tx.send(completion).await.is_err() {
                    trace!(service = %descriptor.id, "duty cycle exited before completion was delivered");
                }
            });
        }
    }
}
