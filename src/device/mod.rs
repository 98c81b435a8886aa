// Device discovery and telemetry capability.
// The polling core only sees these traits; `http` is the adapter the binary wires in.

pub mod http;
pub mod subnet;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::DiscoveryError;
use crate::models::TelemetryRecord;

/// Discovers reachable devices in a subnet spec (CIDR, range or single address).
/// Probe timeout, retries and scan concurrency are the implementation's own tunables.
#[async_trait]
pub trait SubnetScanner: Send + Sync {
    async fn scan_subnet(&self, spec: &str) -> Result<Vec<DeviceHandle>, DiscoveryError>;
}

/// Read-only telemetry access to one device.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Address used for logging skipped devices.
    fn ip(&self) -> &str;

    async fn fetch_telemetry(&self) -> anyhow::Result<TelemetryRecord>;
}

/// Handle to one discovered device, valid for a single polling cycle.
pub type DeviceHandle = Arc<dyn DeviceClient>;
