//! Tests for Coverage Aggregation
//!
//! These tests verify:
//! 1. Empty input yields an all-unfired report
//! 2. Occurrence ordering and first-fired semantics
//! 3. Byte-identical serialization across repeated aggregation

use super::action::{ActionKind, UiAction};
use super::catalog::Catalog;
use super::correlate::CorrelatedEvent;
use super::coverage::*;
use super::matcher::MatchResult;
use super::normalize::TrackingCandidate;
use std::collections::BTreeMap;

fn catalog() -> Catalog {
    Catalog::from_toml_str(
        r#"
[[definition]]
id = "login_click"
required_params = ["uid"]
rule = { kind = "path_prefix", prefix = "/track/login" }

[[definition]]
id = "home_impression"
rule = { kind = "exact_path", path = "/track/impression" }
"#,
    )
    .unwrap()
}

fn event(definition_id: &str, timestamp: i64, correlated: bool) -> CorrelatedEvent {
    let ui_action = correlated.then(|| UiAction {
        seq: 1,
        timestamp: timestamp - 500,
        screen: "MainActivity".to_string(),
        action: ActionKind::Tap,
        label: "login_button".to_string(),
    });
    CorrelatedEvent {
        match_result: MatchResult {
            candidate: TrackingCandidate {
                timestamp,
                method: "GET".to_string(),
                host: "t.example.com".to_string(),
                path: "/track/login".to_string(),
                params: BTreeMap::new(),
                url: "https://t.example.com/track/login?uid=42".to_string(),
            },
            definition_id: definition_id.to_string(),
            matched_params: BTreeMap::new(),
        },
        gap_ms: ui_action.as_ref().map(|a| timestamp - a.timestamp),
        ui_action,
    }
}

#[test]
fn test_empty_events_all_unfired() {
    let report = aggregate(&[], &catalog());
    assert_eq!(report.total_definitions, 2);
    assert_eq!(report.fired_definitions, 0);
    assert_eq!(report.per_definition.len(), 2);
    assert!(report.per_definition.values().all(|c| !c.fired));
    assert!(report
        .per_definition
        .values()
        .all(|c| c.first_fired_at.is_none() && c.occurrences.is_empty()));
    assert_eq!(report.missing(), vec!["home_impression", "login_click"]);
    assert_eq!(report.fired_ratio(), 0.0);
}

#[test]
fn test_single_fired_definition() {
    let report = aggregate(&[event("login_click", 10_000, true)], &catalog());
    assert_eq!(report.fired_definitions, 1);

    let coverage = &report.per_definition["login_click"];
    assert!(coverage.fired);
    assert_eq!(coverage.first_fired_at, Some(10_000));
    assert_eq!(coverage.occurrence_count(), 1);

    assert!(!report.per_definition["home_impression"].fired);
    assert_eq!(report.missing(), vec!["home_impression"]);
}

#[test]
fn test_repeat_occurrences_keep_first_fired_at() {
    let events = vec![event("login_click", 5_000, true), event("login_click", 20_000, false)];
    let report = aggregate(&events, &catalog());

    let coverage = &report.per_definition["login_click"];
    assert_eq!(coverage.occurrence_count(), 2);
    assert_eq!(coverage.first_fired_at, Some(5_000));
    assert_eq!(coverage.occurrences[0].timestamp(), 5_000);
    assert_eq!(coverage.occurrences[1].timestamp(), 20_000);
    // Second occurrence was uncorrelated; it still counts as fired.
    assert!(coverage.occurrences[1].ui_action.is_none());
}

#[test]
fn test_uncorrelated_event_counts_as_fired() {
    let report = aggregate(&[event("home_impression", 3_000, false)], &catalog());
    assert!(report.per_definition["home_impression"].fired);
    assert_eq!(report.fired_definitions, 1);
}

#[test]
fn test_unknown_definition_skipped() {
    let report = aggregate(&[event("not_in_catalog", 1_000, true)], &catalog());
    assert_eq!(report.fired_definitions, 0);
    assert_eq!(report.per_definition.len(), 2);
}

#[test]
fn test_aggregation_is_byte_identical_across_runs() {
    let events = vec![
        event("login_click", 5_000, true),
        event("home_impression", 7_500, true),
        event("login_click", 20_000, false),
    ];
    let catalog = catalog();

    let first = serde_json::to_string(&aggregate(&events, &catalog)).unwrap();
    let second = serde_json::to_string(&aggregate(&events, &catalog)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_fired_ratio() {
    let report = aggregate(&[event("login_click", 1_000, true)], &catalog());
    assert!((report.fired_ratio() - 0.5).abs() < f64::EPSILON);
}
