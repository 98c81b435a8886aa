// Error taxonomy for one polling cycle.
// Per-range and per-device errors are swallowed by the poller; only CycleError reaches callers.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// One range could not be scanned. Other ranges are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("invalid subnet spec {spec:?}: {reason}")]
    InvalidSubnet { spec: String, reason: String },

    #[error("scan of {spec} failed: {message}")]
    Scan { spec: String, message: String },
}

/// One device did not answer its telemetry call in time, or answered with an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device {ip} timed out after {after:?}")]
    Timeout { ip: String, after: Duration },

    #[error("device {ip} fetch failed: {message}")]
    Fetch { ip: String, message: String },
}

impl DeviceError {
    pub fn ip(&self) -> &str {
        match self {
            DeviceError::Timeout { ip, .. } | DeviceError::Fetch { ip, .. } => ip,
        }
    }
}

/// A telemetry record that cannot be turned into a fleet row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedTelemetry {
    #[error("telemetry record has no ip address")]
    MissingIp,

    #[error("device {ip} reported a non-finite {field}")]
    NonFinite { ip: String, field: &'static str },
}

/// Systemic failure of a whole cycle. Clears the published snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("polling cycle panicked: {0}")]
    Panicked(String),

    #[error("fleet total hashrate is not finite")]
    NonFiniteTotal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RangeSetError {
    #[error("duplicate range label {0:?}")]
    DuplicateLabel(String),

    #[error("range label must be non-empty")]
    EmptyLabel,

    #[error("range {0:?} has an empty subnet spec")]
    EmptySubnet(String),
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
