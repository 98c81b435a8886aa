// Fleet aggregator: sort rows and total the fleet hashrate.

use chrono::{DateTime, Utc};

use crate::models::{FleetRow, FleetSnapshot};

/// Builds the snapshot stamped with the current time.
pub fn aggregate(rows: Vec<FleetRow>) -> FleetSnapshot {
    aggregate_at(rows, Utc::now())
}

/// Sorts by hostname descending (stable; absent hostname sorts as "") and sums known hashrates.
pub fn aggregate_at(mut rows: Vec<FleetRow>, captured_at: DateTime<Utc>) -> FleetSnapshot {
    rows.sort_by(|a, b| hostname_key(b).cmp(hostname_key(a)));
    let total_hashrate = total_hashrate(&rows);
    FleetSnapshot {
        rows,
        total_hashrate,
        captured_at,
    }
}

/// Sum of known hashrates; unknown counts as zero and an empty fleet totals 0.
pub fn total_hashrate(rows: &[FleetRow]) -> f64 {
    rows.iter()
        .filter_map(|row| row.hashrate)
        .fold(0.0, |total, hashrate| total + hashrate)
}

fn hostname_key(row: &FleetRow) -> &str {
    row.hostname.as_deref().unwrap_or("")
}
