//! Contract Test: Classification & Planning
//!
//! Constraints verified:
//! - Records resolving to the desired IP are never planned
//! - Confirmed / Mismatched / Unresolved partition all records
//! - DNS failures are skipped with a report line distinct from "already updated"
//! - Every query uses the configured domain

mod common;

use common::*;
use cpdns_core::ResolutionStatus;
use std::collections::HashSet;

#[tokio::test]
async fn confirmed_record_is_not_planned() {
    // Desired 1.2.3.4, esx1 resolves to {1.2.3.4}
    let lookup = MapLookup::new().answer("esx1", &["1.2.3.4"]);
    let panel = FakePanel::new(&[("1", "esx1", "1.2.3.4")]);
    let log = panel.log();

    let config = minimal_config(&["esx1"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(config, StaticIpSource::ok("unused"), lookup, panel);

    let outcome = engine.run().await.expect("run completes");

    assert_eq!(outcome.resolutions[0].status, ResolutionStatus::Confirmed);
    assert!(outcome.plan.is_empty());
    assert!(outcome.report.contains("Skipping esx1: already updated"));
    assert!(outcome.report.contains("No changes needed"));
    assert_eq!(log.lock().unwrap().logins, 0, "no session when nothing to do");
}

#[tokio::test]
async fn mismatched_record_is_planned() {
    let lookup = MapLookup::new().answer("esx2", &["9.9.9.9"]);
    let panel = FakePanel::new(&[("20", "esx2", "9.9.9.9")]);

    let config = minimal_config(&["esx2"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(config, StaticIpSource::ok("unused"), lookup, panel);

    let outcome = engine.run().await.expect("run completes");

    assert_eq!(outcome.resolutions[0].status, ResolutionStatus::Mismatched);
    assert_eq!(outcome.plan.len(), 1);
    assert_eq!(outcome.plan[0].record.name, "esx2");
    assert!(outcome.report.contains("esx2.example.it -> [9.9.9.9] (missing 1.2.3.4)"));
}

#[tokio::test]
async fn dns_timeout_is_unresolved_and_skipped() {
    // esx3 has no answer in the map, so the lookup times out
    let lookup = MapLookup::new();
    let panel = FakePanel::new(&[("30", "esx3", "9.9.9.9")]);
    let log = panel.log();

    let config = minimal_config(&["esx3"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(config, StaticIpSource::ok("unused"), lookup, panel);

    let outcome = engine.run().await.expect("run completes");

    assert_eq!(outcome.resolutions[0].status, ResolutionStatus::Unresolved);
    assert!(outcome.plan.is_empty());
    assert!(outcome.report.contains("Skipping esx3: DNS error"));
    assert!(!outcome.report.contains("already updated"));
    assert!(log.lock().unwrap().submissions.is_empty());
}

#[tokio::test]
async fn partitions_are_disjoint_and_exhaustive() {
    let lookup = MapLookup::new()
        .answer("a", &["1.2.3.4", "5.5.5.5"])
        .answer("b", &["9.9.9.9"])
        .answer("c", &["1.2.3.4"])
        .answer("d", &[]);
    let records = ["a", "b", "c", "d", "e"];

    let config = minimal_config(&records).with_resolve_only(true);
    let mut engine = engine(config, StaticIpSource::ok("1.2.3.4"), lookup, FakePanel::new(&[]));

    let outcome = engine.run().await.expect("run completes");

    let mut seen = HashSet::new();
    let mut total = 0;
    for status in [
        ResolutionStatus::Confirmed,
        ResolutionStatus::Mismatched,
        ResolutionStatus::Unresolved,
    ] {
        for result in outcome.with_status(status) {
            assert!(seen.insert(result.record.name.clone()), "record classified twice");
            total += 1;
        }
    }
    assert_eq!(total, records.len());

    let confirmed: Vec<_> = outcome
        .with_status(ResolutionStatus::Confirmed)
        .map(|r| r.record.name.as_str())
        .collect();
    assert_eq!(confirmed, ["a", "c"]);

    let planned: Vec<_> = outcome.plan.iter().map(|p| p.record.name.as_str()).collect();
    assert_eq!(planned, ["b", "d"]);
    for name in &confirmed {
        assert!(!planned.contains(name));
    }
}

#[tokio::test]
async fn queries_use_configured_domain_in_order() {
    let lookup = MapLookup::new().answer("x", &["1.2.3.4"]).answer("y", &["1.2.3.4"]);
    let queried = lookup.queried();

    let config = minimal_config(&["y", "x"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(config, StaticIpSource::ok("unused"), lookup, FakePanel::new(&[]));
    engine.run().await.expect("run completes");

    assert_eq!(
        *queried.lock().unwrap(),
        vec!["y.example.it".to_string(), "x.example.it".to_string()]
    );
}

#[tokio::test]
async fn ip_override_skips_discovery() {
    let source = StaticIpSource::ok("5.6.7.8");
    let calls = source.call_counter();
    let lookup = MapLookup::new().answer("esx1", &["1.2.3.4"]);

    let config = minimal_config(&["esx1"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(config, source, lookup, FakePanel::new(&[]));
    let outcome = engine.run().await.expect("run completes");

    assert_eq!(outcome.desired.ip, "1.2.3.4");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!outcome.report.contains("Detecting public IP"));
}

#[tokio::test]
async fn report_lists_queried_nameservers() {
    let lookup = MapLookup::new().answer("esx1", &["1.2.3.4"]);
    let config = minimal_config(&["esx1"]).with_ip_override(Some("1.2.3.4".into()));
    let mut engine = engine(
        config,
        StaticIpSource::ok("unused"),
        lookup,
        FakePanel::new(&[]),
    );

    let outcome = engine.run().await.expect("run completes");

    assert!(outcome.report.contains("Querying nameservers: 192.0.2.53"));
}
