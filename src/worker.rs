// Refresh worker: runs a polling cycle on every tick (the first tick fires immediately),
// logs fleet stats on its own interval, and exits on shutdown.

use crate::coordinator::{Coordinator, CycleOutcome};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::time::{Duration, interval};
use tracing::Instrument;

/// Coordinator, connection counter and shutdown for the worker.
pub struct WorkerDeps {
    pub coordinator: Arc<Coordinator>,
    pub ws_fleet_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing config (real seconds).
pub struct WorkerConfig {
    pub interval_secs: u64,
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        coordinator,
        ws_fleet_connections,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        interval_secs,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::debug_span!("worker", interval_secs);
    let worker = async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match coordinator.run_cycle().await {
                        Ok(CycleOutcome::Succeeded(snapshot)) => {
                            tracing::debug!(
                                operation = "scheduled_cycle",
                                devices = snapshot.device_count(),
                                "scheduled cycle complete"
                            );
                        }
                        Ok(CycleOutcome::AlreadyRunning) => {
                            tracing::debug!(
                                operation = "scheduled_cycle",
                                "cycle already in progress"
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                operation = "scheduled_cycle",
                                "scheduled cycle failed"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let stats = coordinator.stats();
                    tracing::info!(
                        ws_fleet_clients =
                            ws_fleet_connections.load(std::sync::atomic::Ordering::Relaxed),
                        cycles_succeeded = stats.succeeded,
                        cycles_failed = stats.failed,
                        cycles_rejected = stats.rejected,
                        devices = stats.last_device_count,
                        "fleet stats"
                    );
                }
            }
        }
    };
    tokio::spawn(worker.instrument(worker_span))
}
