// Range scanner: discovery for one labelled range

use std::sync::Arc;
use tracing::{info, instrument};

use crate::device::{DeviceHandle, SubnetScanner};
use crate::error::DiscoveryError;
use crate::models::RangeDescriptor;

/// A discovered device paired with the label of the range it was found in.
pub type Discovered = (String, DeviceHandle);

#[derive(Clone)]
pub struct RangeScanner {
    scanner: Arc<dyn SubnetScanner>,
}

impl RangeScanner {
    pub fn new(scanner: Arc<dyn SubnetScanner>) -> Self {
        Self { scanner }
    }

    /// Scans one range. Errors are scoped to this range; callers scanning
    /// several ranges keep going.
    #[instrument(skip(self, range), fields(location = %range.label, subnet = %range.subnet_spec))]
    pub async fn scan(&self, range: &RangeDescriptor) -> Result<Vec<Discovered>, DiscoveryError> {
        let devices = self.scanner.scan_subnet(&range.subnet_spec).await?;
        info!(found = devices.len(), "range scanned");
        Ok(devices
            .into_iter()
            .map(|device| (range.label.clone(), device))
            .collect())
    }
}
