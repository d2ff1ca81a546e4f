//! Session Statistics
//!
//! Aggregate texture of the session beyond pass/fail coverage: which hosts
//! were hit and how, which embedded analytics events showed up, how quickly
//! tracking requests followed the gestures that caused them, and a 0-100
//! quality score summarizing the instrumentation.

use crate::engine::capture::RawCapture;
use crate::engine::classify::{DomainClassifier, TrafficClass};
use crate::engine::clock::Millis;
use crate::engine::correlate::CorrelatedEvent;
use crate::engine::extract::extract_events;
use crate::engine::normalize::TrackingCandidate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-host request tally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainStats {
    pub requests: u64,
    pub methods: BTreeMap<String, u64>,
    pub paths: BTreeSet<String>,
    pub class: Option<TrafficClass>,
}

/// Correlation-gap buckets, the latency profile between a gesture and the
/// tracking request it produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyHistogram {
    /// < 500 ms
    pub instant: u64,
    /// 500 ms – 2 s
    pub fast: u64,
    /// 2 s – 5 s
    pub normal: u64,
    /// 5 s – 10 s
    pub delayed: u64,
    /// >= 10 s
    pub slow: u64,
}

impl LatencyHistogram {
    pub fn record(&mut self, gap_ms: Millis) {
        if gap_ms < 500 {
            self.instant += 1;
        } else if gap_ms < 2_000 {
            self.fast += 1;
        } else if gap_ms < 5_000 {
            self.normal += 1;
        } else if gap_ms < 10_000 {
            self.delayed += 1;
        } else {
            self.slow += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.instant + self.fast + self.normal + self.delayed + self.slow
    }

    /// Share of gaps under 2 s.
    pub fn fast_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.instant + self.fast) as f64 / total as f64
    }
}

/// Instrumentation quality score, 0-100.
///
/// Weights: domain discipline 20 (5 per distinct tracking domain), event
/// richness 30 (3 per embedded event type), parameter completeness 30
/// (2 per distinct parameter name), responsiveness 20 (scaled by the share
/// of correlation gaps under 2 s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityScore {
    pub domain_discipline: u32,
    pub event_richness: u32,
    pub param_completeness: u32,
    pub responsiveness: u32,
    pub total: u32,
}

impl QualityScore {
    fn compute(
        tracking_domains: usize,
        event_types: usize,
        unique_params: usize,
        latency: &LatencyHistogram,
    ) -> Self {
        let domain_discipline = (tracking_domains as u32 * 5).min(20);
        let event_richness = (event_types as u32 * 3).min(30);
        let param_completeness = (unique_params as u32 * 2).min(30);
        let responsiveness = (latency.fast_ratio() * 20.0).round() as u32;
        Self {
            domain_discipline,
            event_richness,
            param_completeness,
            responsiveness,
            total: domain_discipline + event_richness + param_completeness + responsiveness,
        }
    }
}

/// Everything the report carries beyond coverage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub total_requests: u64,
    pub degraded_records: u64,
    pub tracking_requests: u64,
    pub business_requests: u64,
    pub noise_requests: u64,
    pub domains: BTreeMap<String, DomainStats>,
    /// Embedded analytics event name -> occurrence count.
    pub event_counts: BTreeMap<String, u64>,
    /// Embedded event name -> param name -> occurrence count.
    pub event_params: BTreeMap<String, BTreeMap<String, u64>>,
    pub latency: LatencyHistogram,
    pub correlated_events: u64,
    pub uncorrelated_events: u64,
    pub quality: QualityScore,
}

impl SessionStats {
    /// Collect statistics over the session. `captures` and `candidates` are
    /// parallel (one candidate per capture record).
    pub fn collect(
        captures: &[RawCapture],
        candidates: &[TrackingCandidate],
        classifier: &DomainClassifier,
        correlated: &[CorrelatedEvent],
    ) -> Self {
        debug_assert_eq!(captures.len(), candidates.len());
        let mut stats = SessionStats::default();

        for (capture, candidate) in captures.iter().zip(candidates) {
            stats.total_requests += 1;
            if capture.is_degraded() {
                stats.degraded_records += 1;
                continue;
            }

            let class = classifier.classify(&candidate.host);
            match class {
                TrafficClass::Tracking => stats.tracking_requests += 1,
                TrafficClass::Business => stats.business_requests += 1,
                TrafficClass::Noise => stats.noise_requests += 1,
            }

            let domain = stats.domains.entry(candidate.host.clone()).or_default();
            domain.requests += 1;
            *domain.methods.entry(candidate.method.clone()).or_default() += 1;
            domain.paths.insert(candidate.path.clone());
            domain.class = Some(class);

            if let Some(body) = &capture.body {
                for event in extract_events(body) {
                    *stats.event_counts.entry(event.name.clone()).or_default() += 1;
                    let params = stats.event_params.entry(event.name).or_default();
                    for key in event.params.into_keys() {
                        *params.entry(key).or_default() += 1;
                    }
                }
            }
        }

        for event in correlated {
            match event.gap_ms {
                Some(gap) => {
                    stats.correlated_events += 1;
                    stats.latency.record(gap);
                }
                None => stats.uncorrelated_events += 1,
            }
        }

        let tracking_domains = stats
            .domains
            .values()
            .filter(|d| d.class == Some(TrafficClass::Tracking))
            .count();
        let unique_params: BTreeSet<&str> = stats
            .event_params
            .values()
            .flat_map(|params| params.keys().map(String::as_str))
            .collect();
        stats.quality = QualityScore::compute(
            tracking_domains,
            stats.event_counts.len(),
            unique_params.len(),
            &stats.latency,
        );

        stats
    }
}
