// Batch poller: discovery across ranges, then bounded concurrent telemetry fetches.
// Ranges run in fixed-size batches; the next batch starts after the previous one fans in.
// A failed, timed-out or panicking device is logged and dropped, never propagated.

use futures_util::future::join_all;
use futures_util::{FutureExt, StreamExt, stream};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::warn;

use crate::device::DeviceHandle;
use crate::error::{DeviceError, panic_message};
use crate::models::{RangeDescriptor, TelemetryRecord};
use crate::scanner::RangeScanner;

pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_CONCURRENCY: usize = 64;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Ranges scanned concurrently per batch.
    pub batch_size: usize,
    /// Per-device telemetry timeout.
    pub fetch_timeout: Duration,
    /// Max in-flight telemetry fetches within one range.
    pub fetch_concurrency: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

/// Telemetry from a device that answered, with the location label of its range.
#[derive(Debug, Clone, PartialEq)]
pub struct PolledDevice {
    pub location: String,
    pub record: TelemetryRecord,
}

pub struct BatchPoller {
    scanner: RangeScanner,
    config: PollerConfig,
}

impl BatchPoller {
    pub fn new(scanner: RangeScanner, config: PollerConfig) -> Self {
        Self { scanner, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Polls every range and returns the devices that answered. Order is unspecified.
    pub async fn poll_fleet(&self, ranges: &[RangeDescriptor]) -> Vec<PolledDevice> {
        let mut polled = Vec::new();
        for batch in ranges.chunks(self.config.batch_size.max(1)) {
            let results = join_all(batch.iter().map(|range| self.poll_range(range))).await;
            for devices in results {
                polled.extend(devices);
            }
        }
        polled
    }

    async fn poll_range(&self, range: &RangeDescriptor) -> Vec<PolledDevice> {
        let discovered = match self.scanner.scan(range).await {
            Ok(d) => d,
            Err(e) => {
                warn!(
                    error = %e,
                    location = %range.label,
                    operation = "scan_range",
                    "range discovery failed, skipping range"
                );
                return Vec::new();
            }
        };

        // Collected first: an async `.map` closure here makes the spawned cycle future non-Send.
        let fetches: Vec<_> = discovered
            .into_iter()
            .map(|(location, device)| self.fetch_tagged(location, device))
            .collect();
        stream::iter(fetches)
            .buffer_unordered(self.config.fetch_concurrency.max(1))
            .filter_map(std::future::ready)
            .collect()
            .await
    }

    async fn fetch_tagged(&self, location: String, device: DeviceHandle) -> Option<PolledDevice> {
        match self.fetch(&device).await {
            Ok(record) => Some(PolledDevice { location, record }),
            Err(e) => {
                warn!(
                    error = %e,
                    ip = e.ip(),
                    location = %location,
                    operation = "fetch_telemetry",
                    "device skipped"
                );
                None
            }
        }
    }

    /// One telemetry call under the per-device timeout. A timed-out call is dropped (cancelled);
    /// a panicking client is reported as a fetch error for that device only.
    pub async fn fetch(&self, device: &DeviceHandle) -> Result<TelemetryRecord, DeviceError> {
        let call = AssertUnwindSafe(device.fetch_telemetry()).catch_unwind();
        match tokio::time::timeout(self.config.fetch_timeout, call).await {
            Ok(Ok(Ok(record))) => Ok(record),
            Ok(Ok(Err(e))) => Err(DeviceError::Fetch {
                ip: device.ip().to_string(),
                message: format!("{e:#}"),
            }),
            Ok(Err(panic)) => Err(DeviceError::Fetch {
                ip: device.ip().to_string(),
                message: format!("client panicked: {}", panic_message(panic.as_ref())),
            }),
            Err(_) => Err(DeviceError::Timeout {
                ip: device.ip().to_string(),
                after: self.config.fetch_timeout,
            }),
        }
    }
}
