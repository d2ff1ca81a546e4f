//! Session Pipeline
//!
//! The single entry point that drives a full analysis pass over one
//! traversal session's materialized logs. Stages run sequentially; no stage
//! touches external I/O. Both logs are fully read before this is called,
//! and the only shared state is the read-only catalog.

use crate::engine::action::UiAction;
use crate::engine::capture::RawCapture;
use crate::engine::catalog::Catalog;
use crate::engine::classify::DomainClassifier;
use crate::engine::clock::Millis;
use crate::engine::correlate::{
    check_seq_strictly_increasing, check_time_sorted, correlate, InputOrderError,
};
use crate::engine::coverage::{aggregate, CoverageReport};
use crate::engine::matcher::match_all;
use crate::engine::normalize::normalize;
use crate::engine::stats::SessionStats;
use serde::Serialize;
use tracing::info;

/// Coverage plus session statistics, serializable for the external renderer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub coverage: CoverageReport,
    pub stats: SessionStats,
}

/// Run the full pipeline: normalize -> match -> correlate -> aggregate ->
/// stats.
///
/// Fails only on an ordering precondition violation in either input log;
/// per-record damage was already degraded at read time and flows through as
/// candidates that match nothing.
pub fn analyze_session(
    captures: &[RawCapture],
    actions: &[UiAction],
    catalog: &Catalog,
    classifier: &DomainClassifier,
    tolerance_ms: Millis,
) -> Result<SessionReport, InputOrderError> {
    check_time_sorted("capture", captures, |c| c.timestamp)?;
    check_time_sorted("ui action", actions, |a| a.timestamp)?;
    check_seq_strictly_increasing(actions)?;

    info!(
        captures = captures.len(),
        actions = actions.len(),
        definitions = catalog.len(),
        tolerance_ms,
        "analyzing session"
    );

    let candidates: Vec<_> = captures.iter().map(normalize).collect();
    let matches = match_all(&candidates, catalog);
    let correlated = correlate(&matches, actions, tolerance_ms)?;
    let coverage = aggregate(&correlated, catalog);
    let stats = SessionStats::collect(captures, &candidates, classifier, &correlated);

    info!(
        matched = matches.len(),
        fired = coverage.fired_definitions,
        total = coverage.total_definitions,
        uncorrelated = stats.uncorrelated_events,
        "session analysis complete"
    );

    Ok(SessionReport { coverage, stats })
}
