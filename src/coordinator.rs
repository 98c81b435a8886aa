// Polling cycle coordinator: Idle -> Running -> (Succeeded | Failed) -> Idle.
// Owns the range set, the published snapshot and the fleet event channel.
// The running flag is only set here, via compare-exchange.

use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};
use tracing::{Instrument, debug, info, instrument, warn};

use crate::aggregate::aggregate;
use crate::error::{CycleError, RangeSetError, panic_message};
use crate::models::{FleetRow, FleetSnapshot, RangeDescriptor, RangeSet};
use crate::normalize::normalize;
use crate::poller::BatchPoller;

/// Cycle status signal for the presentation layer; serializes kebab-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleStatus {
    Started,
    Succeeded,
    Failed,
    AlreadyRunning,
}

/// Everything pushed to fleet subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FleetEvent {
    Status { status: CycleStatus },
    Snapshot(FleetSnapshot),
    /// Published snapshot was dropped after a failed cycle.
    Cleared,
}

#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Succeeded(Arc<FleetSnapshot>),
    /// Another cycle was in flight; nothing was started or changed.
    AlreadyRunning,
}

/// Counters for the periodic stats log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub last_device_count: u64,
}

/// Clears the running flag when the cycle ends, including on cancellation.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Coordinator {
    poller: BatchPoller,
    ranges: RwLock<RangeSet>,
    published: RwLock<Option<Arc<FleetSnapshot>>>,
    running: AtomicBool,
    events: broadcast::Sender<FleetEvent>,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    last_device_count: AtomicU64,
}

impl Coordinator {
    pub fn new(poller: BatchPoller, ranges: RangeSet, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            poller,
            ranges: RwLock::new(ranges),
            published: RwLock::new(None),
            running: AtomicBool::new(false),
            events,
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            last_device_count: AtomicU64::new(0),
        }
    }

    /// Runs one cycle unless one is already in flight.
    /// On success the snapshot replaces the published one; on failure the published one is cleared.
    ///
    /// The cycle runs on its own task and owns the running flag until it finishes, so dropping
    /// this future (e.g. a disconnected HTTP client) neither stops the cycle nor frees the flag.
    #[instrument(skip(self))]
    pub async fn run_cycle(self: &Arc<Self>) -> Result<CycleOutcome, CycleError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Already updating fleet data, skipping re-run");
            self.rejected.fetch_add(1, Ordering::Relaxed);
            self.emit(FleetEvent::Status {
                status: CycleStatus::AlreadyRunning,
            });
            return Ok(CycleOutcome::AlreadyRunning);
        }

        let coordinator = self.clone();
        let cycle = tokio::spawn(
            async move { coordinator.finish_cycle().await }.instrument(tracing::Span::current()),
        );
        match cycle.await {
            Ok(result) => result,
            Err(e) => Err(CycleError::Panicked(e.to_string())),
        }
    }

    /// Body of a cycle that has already claimed the running flag.
    async fn finish_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let running = RunningGuard(&self.running);
        self.emit(FleetEvent::Status {
            status: CycleStatus::Started,
        });

        let ranges = self.ranges.read().await.descriptors().to_vec();
        info!(ranges = ranges.len(), "Updating fleet data");

        let result = match AssertUnwindSafe(collect_snapshot(&self.poller, &ranges))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(CycleError::Panicked(panic_message(panic.as_ref()).to_string())),
        };

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.published.write().await = Some(snapshot.clone());
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                self.last_device_count
                    .store(snapshot.device_count() as u64, Ordering::Relaxed);
                drop(running);
                info!(
                    devices = snapshot.device_count(),
                    total_hashrate = snapshot.total_hashrate,
                    "Finished updating fleet data"
                );
                self.emit(FleetEvent::Snapshot(snapshot.as_ref().clone()));
                self.emit(FleetEvent::Status {
                    status: CycleStatus::Succeeded,
                });
                Ok(CycleOutcome::Succeeded(snapshot))
            }
            Err(e) => {
                *self.published.write().await = None;
                self.failed.fetch_add(1, Ordering::Relaxed);
                drop(running);
                warn!(error = %e, operation = "run_cycle", "Fleet update failed, snapshot cleared");
                self.emit(FleetEvent::Cleared);
                self.emit(FleetEvent::Status {
                    status: CycleStatus::Failed,
                });
                Err(e)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn published(&self) -> Option<Arc<FleetSnapshot>> {
        self.published.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> CycleStats {
        CycleStats {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            last_device_count: self.last_device_count.load(Ordering::Relaxed),
        }
    }

    pub async fn ranges(&self) -> Vec<RangeDescriptor> {
        self.ranges.read().await.descriptors().to_vec()
    }

    /// Appends a range; takes effect from the next cycle.
    pub async fn add_range(&self, range: RangeDescriptor) -> Result<(), RangeSetError> {
        let label = range.label.clone();
        self.ranges.write().await.insert(range)?;
        info!(location = %label, "range added");
        Ok(())
    }

    /// Removes one range by label; takes effect from the next cycle.
    pub async fn remove_range(&self, label: &str) -> bool {
        let removed = self.ranges.write().await.remove(label);
        if removed {
            info!(location = label, "range removed");
        }
        removed
    }

    /// Replaces the whole range set (no merge).
    pub async fn reset_ranges(&self, ranges: RangeSet) {
        info!(ranges = ranges.len(), "ranges reset");
        *self.ranges.write().await = ranges;
    }

    fn emit(&self, event: FleetEvent) {
        if self.events.send(event).is_err() {
            debug!(operation = "broadcast_fleet_event", "No fleet subscribers");
        }
    }
}

/// poll -> normalize -> aggregate. Malformed records are skipped like failed fetches.
async fn collect_snapshot(
    poller: &BatchPoller,
    ranges: &[RangeDescriptor],
) -> Result<FleetSnapshot, CycleError> {
    let polled = poller.poll_fleet(ranges).await;
    let rows: Vec<FleetRow> = polled
        .iter()
        .filter_map(|device| match normalize(&device.record, &device.location) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(
                    error = %e,
                    ip = device.record.ip.as_deref().unwrap_or("unknown"),
                    location = %device.location,
                    operation = "normalize",
                    "device skipped"
                );
                None
            }
        })
        .collect();

    let snapshot = aggregate(rows);
    if !snapshot.total_hashrate.is_finite() {
        return Err(CycleError::NonFiniteTotal);
    }
    Ok(snapshot)
}
