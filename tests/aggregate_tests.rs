// Fleet aggregator: hostname ordering, fleet total, timestamp

use chrono::{TimeZone, Utc};
use minerdash::aggregate::{aggregate, aggregate_at, total_hashrate};
use minerdash::models::*;
use minerdash::normalize::normalize;

fn row(ip: &str, hostname: Option<&str>, hashrate: Option<f64>) -> FleetRow {
    let record = TelemetryRecord {
        ip: Some(ip.into()),
        hostname: hostname.map(str::to_string),
        hashrate,
        is_mining: Some(true),
        ..Default::default()
    };
    normalize(&record, "site").unwrap()
}

fn hostnames(snapshot: &FleetSnapshot) -> Vec<Option<&str>> {
    snapshot.rows.iter().map(|r| r.hostname.as_deref()).collect()
}

#[test]
fn three_devices_sorted_descending_with_total() {
    let rows = vec![
        row("10.0.0.1", Some("C"), Some(10.0)),
        row("10.0.0.2", Some("A"), Some(20.0)),
        row("10.0.0.3", Some("B"), None),
    ];
    let snapshot = aggregate(rows);
    assert_eq!(hostnames(&snapshot), vec![Some("C"), Some("B"), Some("A")]);
    assert_eq!(snapshot.total_hashrate, 30.0);
}

#[test]
fn empty_fleet_totals_zero() {
    let snapshot = aggregate(vec![]);
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.total_hashrate, 0.0);
    assert!(snapshot.total_hashrate.is_sign_positive());
}

#[test]
fn absent_hostnames_sort_as_empty_and_cluster_last() {
    let rows = vec![
        row("10.0.0.1", None, Some(1.0)),
        row("10.0.0.2", Some("b"), Some(1.0)),
        row("10.0.0.3", None, Some(1.0)),
        row("10.0.0.4", Some(""), Some(1.0)),
        row("10.0.0.5", Some("a"), Some(1.0)),
    ];
    let snapshot = aggregate(rows);
    let ips: Vec<&str> = snapshot.rows.iter().map(|r| r.ip.as_str()).collect();
    // "" and absent compare equal, so their input order is kept.
    assert_eq!(
        ips,
        vec!["10.0.0.2", "10.0.0.5", "10.0.0.1", "10.0.0.3", "10.0.0.4"]
    );
}

#[test]
fn ordering_is_stable_for_equal_hostnames() {
    let rows = vec![
        row("10.0.0.1", Some("rig"), Some(1.0)),
        row("10.0.0.2", Some("rig"), Some(2.0)),
        row("10.0.0.3", Some("zed"), Some(3.0)),
        row("10.0.0.4", Some("rig"), Some(4.0)),
    ];
    let snapshot = aggregate(rows);
    let ips: Vec<&str> = snapshot.rows.iter().map(|r| r.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2", "10.0.0.4"]);
}

#[test]
fn every_adjacent_pair_is_descending() {
    let names = ["m07", "m10", "a", "m1", "Z", "m07b", "", "zz"];
    let rows = names
        .iter()
        .enumerate()
        .map(|(i, n)| row(&format!("10.0.1.{i}"), Some(n), Some(i as f64)))
        .collect();
    let snapshot = aggregate(rows);
    for pair in snapshot.rows.windows(2) {
        assert!(pair[0].hostname >= pair[1].hostname);
    }
}

#[test]
fn total_treats_unknown_as_zero() {
    let cases: Vec<(Vec<Option<f64>>, f64)> = vec![
        (vec![], 0.0),
        (vec![None, None], 0.0),
        (vec![Some(1.5), None, Some(2.25)], 3.75),
        (vec![Some(0.0), Some(100.0)], 100.0),
    ];
    for (hashrates, expected) in cases {
        let rows: Vec<FleetRow> = hashrates
            .iter()
            .enumerate()
            .map(|(i, h)| row(&format!("10.0.2.{i}"), Some("m"), *h))
            .collect();
        assert_eq!(total_hashrate(&rows), expected);
        assert_eq!(aggregate(rows).total_hashrate, expected);
    }
}

#[test]
fn captured_at_is_the_aggregation_time() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let snapshot = aggregate_at(vec![row("10.0.0.1", Some("a"), Some(1.0))], at);
    assert_eq!(snapshot.captured_at, at);

    let before = Utc::now();
    let snapshot = aggregate(vec![]);
    assert!(snapshot.captured_at >= before);
}
