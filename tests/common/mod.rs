// Shared test helpers: in-memory scanner and devices

#![allow(dead_code)]

use async_trait::async_trait;
use minerdash::coordinator::Coordinator;
use minerdash::device::{DeviceClient, DeviceHandle, SubnetScanner};
use minerdash::error::DiscoveryError;
use minerdash::models::*;
use minerdash::poller::{BatchPoller, PollerConfig};
use minerdash::scanner::RangeScanner;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// How a fake device answers its telemetry call.
#[derive(Debug, Clone)]
pub enum Behavior {
    Answer(TelemetryRecord),
    Fail(String),
    Hang,
    Delay(Duration, TelemetryRecord),
    Panic,
}

pub struct FakeDevice {
    ip: String,
    behavior: Behavior,
}

#[async_trait]
impl DeviceClient for FakeDevice {
    fn ip(&self) -> &str {
        &self.ip
    }

    async fn fetch_telemetry(&self) -> anyhow::Result<TelemetryRecord> {
        match &self.behavior {
            Behavior::Answer(record) => Ok(record.clone()),
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
            Behavior::Hang => std::future::pending().await,
            Behavior::Delay(delay, record) => {
                tokio::time::sleep(*delay).await;
                Ok(record.clone())
            }
            Behavior::Panic => panic!("device {} blew up", self.ip),
        }
    }
}

/// What a fake subnet yields when scanned.
#[derive(Debug, Clone)]
pub enum FakeRange {
    Devices(Vec<(String, Behavior)>),
    Fail,
    Invalid,
}

/// Scanner keyed by subnet spec. Unknown specs scan as empty.
#[derive(Default)]
pub struct FakeScanner {
    ranges: HashMap<String, FakeRange>,
    scan_delay: Option<Duration>,
    gate: Option<Gate>,
    /// When set, every scan panics.
    pub panic_switch: Arc<AtomicBool>,
    pub scans: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    pub max_in_flight: Arc<AtomicUsize>,
}

/// Holds scans until released: `entered` fires when a scan starts, `release` lets it continue.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, spec: &str, range: FakeRange) -> Self {
        self.ranges.insert(spec.to_string(), range);
        self
    }

    pub fn scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = Some(delay);
        self
    }

    pub fn gated(mut self) -> (Self, Gate) {
        let gate = Gate::default();
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

#[async_trait]
impl SubnetScanner for FakeScanner {
    async fn scan_subnet(&self, spec: &str) -> Result<Vec<DeviceHandle>, DiscoveryError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.panic_switch.load(Ordering::SeqCst) {
            panic!("scanner blew up on {spec}");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.ranges.get(spec) {
            None => Ok(vec![]),
            Some(FakeRange::Fail) => Err(DiscoveryError::Scan {
                spec: spec.to_string(),
                message: "network unreachable".into(),
            }),
            Some(FakeRange::Invalid) => Err(DiscoveryError::InvalidSubnet {
                spec: spec.to_string(),
                reason: "bad".into(),
            }),
            Some(FakeRange::Devices(devices)) => Ok(devices
                .iter()
                .map(|(ip, behavior)| {
                    Arc::new(FakeDevice {
                        ip: ip.clone(),
                        behavior: behavior.clone(),
                    }) as DeviceHandle
                })
                .collect()),
        }
    }
}

pub fn record(ip: &str, hostname: Option<&str>, hashrate: Option<f64>) -> TelemetryRecord {
    TelemetryRecord {
        ip: Some(ip.to_string()),
        hostname: hostname.map(str::to_string),
        hashrate,
        is_mining: Some(true),
        ..Default::default()
    }
}

pub fn answering(ip: &str, hostname: &str, hashrate: f64) -> (String, Behavior) {
    (
        ip.to_string(),
        Behavior::Answer(record(ip, Some(hostname), Some(hashrate))),
    )
}

pub fn ranges(pairs: &[(&str, &str)]) -> RangeSet {
    RangeSet::from_descriptors(
        pairs
            .iter()
            .map(|(label, spec)| RangeDescriptor::new(*label, *spec))
            .collect(),
    )
    .expect("unique labels")
}

pub fn test_poller_config() -> PollerConfig {
    PollerConfig {
        batch_size: 3,
        fetch_timeout: Duration::from_millis(200),
        fetch_concurrency: 8,
    }
}

pub fn poller(scanner: FakeScanner, config: PollerConfig) -> BatchPoller {
    BatchPoller::new(RangeScanner::new(Arc::new(scanner)), config)
}

pub fn coordinator(scanner: FakeScanner, pairs: &[(&str, &str)]) -> Arc<Coordinator> {
    Arc::new(Coordinator::new(
        poller(scanner, test_poller_config()),
        ranges(pairs),
        32,
    ))
}
