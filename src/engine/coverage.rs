//! Coverage Aggregation
//!
//! Folds the session's correlated events into the final per-definition
//! coverage. The report is owned by exactly one aggregation pass, finalized
//! before anyone sees it, and deterministic: ordered maps plus time-ordered
//! occurrence lists mean identical inputs serialize byte-identically.

use crate::engine::catalog::Catalog;
use crate::engine::clock::Millis;
use crate::engine::correlate::CorrelatedEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Evidence for one tracking-point definition across the session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefinitionCoverage {
    /// Whether the definition was observed at least once.
    pub fired: bool,
    /// Timestamp of the earliest occurrence. First write wins; input is
    /// time-ordered so later occurrences can never move it.
    pub first_fired_at: Option<Millis>,
    /// Every occurrence, in timestamp order, with its UI-action linkage.
    pub occurrences: Vec<CorrelatedEvent>,
}

impl DefinitionCoverage {
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }
}

/// Final coverage result for one traversal session.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    /// Keyed by definition id; every catalog definition has an entry.
    pub per_definition: BTreeMap<String, DefinitionCoverage>,
    pub total_definitions: usize,
    pub fired_definitions: usize,
}

impl CoverageReport {
    /// Fired fraction in [0, 1].
    pub fn fired_ratio(&self) -> f64 {
        if self.total_definitions == 0 {
            0.0
        } else {
            self.fired_definitions as f64 / self.total_definitions as f64
        }
    }

    /// Ids of definitions that never fired, in id order.
    pub fn missing(&self) -> Vec<&str> {
        self.per_definition
            .iter()
            .filter(|(_, cov)| !cov.fired)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Aggregate time-ordered correlated events into a coverage report.
///
/// Every catalog definition starts unfired; each event marks its definition
/// fired and appends to its occurrence list. Deterministic and idempotent:
/// re-aggregating the same sequence yields a byte-identical report.
pub fn aggregate(events: &[CorrelatedEvent], catalog: &Catalog) -> CoverageReport {
    let mut per_definition: BTreeMap<String, DefinitionCoverage> = catalog
        .definitions()
        .iter()
        .map(|def| (def.id.clone(), DefinitionCoverage::default()))
        .collect();

    for event in events {
        let Some(coverage) = per_definition.get_mut(&event.match_result.definition_id) else {
            // Cannot arise when matcher and aggregator share a catalog.
            warn!(
                definition = %event.match_result.definition_id,
                "correlated event references unknown definition; skipping"
            );
            continue;
        };
        coverage.fired = true;
        if coverage.first_fired_at.is_none() {
            coverage.first_fired_at = Some(event.timestamp());
        }
        coverage.occurrences.push(event.clone());
    }

    let fired_definitions = per_definition.values().filter(|c| c.fired).count();
    CoverageReport {
        total_definitions: catalog.len(),
        fired_definitions,
        per_definition,
    }
}
