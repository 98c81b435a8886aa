// Raw per-device telemetry as reported by the device adapter.
// Every field may be absent; absent is never the same as zero.

use serde::{Deserialize, Serialize};

/// One poll of one device. Rates are TH/s, power is watts, temperature is Celsius.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub ip: Option<String>,
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub make: Option<String>,
    pub firmware: Option<String>,
    pub temperature: Option<f64>,
    pub hashrate: Option<f64>,
    pub expected_hashrate: Option<f64>,
    pub power: Option<f64>,
    /// Efficiency in W/TH, when the device computes it itself.
    pub efficiency: Option<f64>,
    pub is_mining: Option<bool>,
    #[serde(default)]
    pub boards: Vec<BoardTelemetry>,
    #[serde(default)]
    pub pools: Vec<PoolAssignment>,
}

/// One hashing board, identified by its slot index (0-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTelemetry {
    pub slot: u8,
    pub hashrate: Option<f64>,
    pub voltage: Option<f64>,
    #[serde(default)]
    pub missing: bool,
}

/// A configured pool and the worker identity used on it (e.g. "account.rig01").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolAssignment {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub user: String,
}
