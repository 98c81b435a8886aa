// Row normalizer: raw telemetry -> display-ready FleetRow.
// Display rounding for rates happens here and nowhere else.

use tracing::debug;

use crate::error::MalformedTelemetry;
use crate::models::{
    BoardSlots, FleetRow, MAX_BOARD_SLOTS, PerformanceBand, PoolAssignment, TelemetryRecord,
};

/// Builds the row for one device. Pure: the same input always gives the same row.
pub fn normalize(record: &TelemetryRecord, location: &str) -> Result<FleetRow, MalformedTelemetry> {
    let ip = record
        .ip
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .ok_or(MalformedTelemetry::MissingIp)?
        .to_string();
    check_finite(record, &ip)?;

    let mut boards = BoardSlots::default();
    let mut board_count = 0;
    for board in &record.boards {
        if !board.missing && board.hashrate.is_some_and(|h| h > 0.0) {
            board_count += 1;
        }
        match boards.0.get_mut(board.slot as usize) {
            Some(slot) => *slot = board.hashrate.map(round2),
            None => debug!(
                ip = %ip,
                slot = board.slot,
                max = MAX_BOARD_SLOTS,
                "board slot has no display column, counted but not shown"
            ),
        }
    }

    let voltage = record
        .boards
        .iter()
        .filter_map(|b| b.voltage)
        .reduce(f64::max)
        .map(round2);

    let performance = performance(record.hashrate, record.expected_hashrate);

    Ok(FleetRow {
        location: location.to_string(),
        ip,
        status: record.is_mining.unwrap_or(false) && record.hashrate.is_some_and(|h| h > 0.0),
        make: record.make.clone(),
        model: record.model.clone(),
        firmware: record.firmware.clone(),
        hostname: record.hostname.clone(),
        temperature: record.temperature.map(|t| t.round() as i64),
        hashrate: record.hashrate.map(round2),
        performance,
        performance_band: performance.map(PerformanceBand::from_performance),
        board_count,
        boards,
        voltage,
        power: record.power.map(|p| p.round() as i64),
        efficiency: efficiency(record).map(round2),
        worker: worker_name(&record.pools),
    })
}

/// Percent of expected hashrate, known only when expected is known and positive.
pub fn performance(hashrate: Option<f64>, expected_hashrate: Option<f64>) -> Option<f64> {
    match (hashrate, expected_hashrate) {
        (Some(hashrate), Some(expected)) if expected > 0.0 => {
            Some(round2(hashrate / expected * 100.0))
        }
        _ => None,
    }
}

/// Last dot-delimited segment of the first active pool's user ("acct.rig01" -> "rig01").
pub fn worker_name(pools: &[PoolAssignment]) -> Option<String> {
    pools
        .iter()
        .find(|p| p.active)
        .and_then(|p| p.user.rsplit('.').next())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
}

/// Reported W/TH, else power / hashrate when both are known.
fn efficiency(record: &TelemetryRecord) -> Option<f64> {
    record.efficiency.or(match (record.power, record.hashrate) {
        (Some(power), Some(hashrate)) if hashrate > 0.0 => Some(power / hashrate),
        _ => None,
    })
}

fn check_finite(record: &TelemetryRecord, ip: &str) -> Result<(), MalformedTelemetry> {
    let fields = [
        ("temperature", record.temperature),
        ("hashrate", record.hashrate),
        ("expected_hashrate", record.expected_hashrate),
        ("power", record.power),
        ("efficiency", record.efficiency),
    ];
    let boards = record.boards.iter().flat_map(|b| {
        [
            ("board hashrate", b.hashrate),
            ("board voltage", b.voltage),
        ]
    });
    for (field, value) in fields.into_iter().chain(boards) {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(MalformedTelemetry::NonFinite {
                ip: ip.to_string(),
                field,
            });
        }
    }
    Ok(())
}

/// Rounds to 2 decimal places. Magnitudes past 1e15 carry no fractional digits and pass through.
pub fn round2(value: f64) -> f64 {
    if value.abs() >= 1e15 {
        return value;
    }
    (value * 100.0).round() / 100.0
}
