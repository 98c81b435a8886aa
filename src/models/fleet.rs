// Display-ready fleet rows and the per-cycle snapshot

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Highest number of hashing boards a device row can carry.
pub const MAX_BOARD_SLOTS: usize = 4;

/// Performance coloring bucket; serializes lowercase (e.g. "nominal").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBand {
    Low,
    Degraded,
    Nominal,
}

impl PerformanceBand {
    /// Below 90% is low, below 98% is degraded, anything else is nominal.
    pub fn from_performance(percent: f64) -> Self {
        if percent < 90.0 {
            PerformanceBand::Low
        } else if percent < 98.0 {
            PerformanceBand::Degraded
        } else {
            PerformanceBand::Nominal
        }
    }
}

/// Per-slot board hashrates; slot 0 is `board_1`. Serializes as `hb0`..`hb3`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoardSlots(pub [Option<f64>; MAX_BOARD_SLOTS]);

impl BoardSlots {
    /// Hashrate of the board in this 0-based slot, if one reported.
    pub fn get(&self, slot: usize) -> Option<f64> {
        self.0.get(slot).copied().flatten()
    }
}

impl Serialize for BoardSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MAX_BOARD_SLOTS))?;
        for (slot, hashrate) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("hb{slot}"), hashrate)?;
        }
        map.end()
    }
}

/// One device, normalized. Keys are the short column names the dashboard grid uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetRow {
    pub location: String,
    #[serde(serialize_with = "serialize_ip_link")]
    pub ip: String,
    pub status: bool,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "fw")]
    pub firmware: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "temp")]
    pub temperature: Option<i64>,
    pub hashrate: Option<f64>,
    #[serde(rename = "perf")]
    pub performance: Option<f64>,
    #[serde(rename = "perfBand")]
    pub performance_band: Option<PerformanceBand>,
    #[serde(rename = "hbs")]
    pub board_count: u32,
    #[serde(flatten)]
    pub boards: BoardSlots,
    pub voltage: Option<f64>,
    #[serde(rename = "rpower")]
    pub power: Option<i64>,
    #[serde(rename = "eff")]
    pub efficiency: Option<f64>,
    pub worker: Option<String>,
}

fn serialize_ip_link<S: Serializer>(ip: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!(
        r#"<a href="http://{ip}" target="_blank">{ip}</a>"#
    ))
}

/// Result of one successful polling cycle. Replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    /// Ordered by hostname, descending; absent hostnames sort as "".
    pub rows: Vec<FleetRow>,
    /// Sum of known row hashrates in TH/s.
    pub total_hashrate: f64,
    pub captured_at: DateTime<Utc>,
}

impl FleetSnapshot {
    pub fn device_count(&self) -> usize {
        self.rows.len()
    }
}
