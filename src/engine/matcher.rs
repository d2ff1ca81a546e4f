//! Candidate Matcher
//!
//! Classifies normalized candidates against the catalog. A candidate may
//! match zero definitions (most captured traffic is not a tracking event and
//! is silently dropped), one, or several: definitions may legitimately
//! share an endpoint pattern, so matching is not forced one-to-one.

use crate::engine::catalog::{Catalog, TrackingDefinition};
use crate::engine::clock::Millis;
use crate::engine::normalize::TrackingCandidate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One candidate confirmed as one tracking point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The candidate that fired, kept whole as report evidence.
    pub candidate: TrackingCandidate,
    /// Id of the matched definition.
    pub definition_id: String,
    /// The required params plus any declared optional params that were
    /// present. Only catalog-named keys are captured; the rest of the
    /// candidate's parameters stay out of the evidence.
    pub matched_params: BTreeMap<String, String>,
}

impl MatchResult {
    #[inline]
    pub fn timestamp(&self) -> Millis {
        self.candidate.timestamp
    }
}

/// Match one candidate against the catalog, in declaration order.
///
/// A definition matches when its rule holds AND every required param is
/// present with a non-empty value. Paths and parameter keys compare
/// case-sensitively; hosts case-insensitively (lowercased at normalization).
pub fn match_candidate(candidate: &TrackingCandidate, catalog: &Catalog) -> Vec<MatchResult> {
    let mut results = Vec::new();
    for def in catalog.lookup_candidates(candidate) {
        if let Some(matched_params) = collect_params(candidate, def) {
            debug!(
                definition = %def.id,
                host = %candidate.host,
                path = %candidate.path,
                "candidate matched"
            );
            results.push(MatchResult {
                candidate: candidate.clone(),
                definition_id: def.id.clone(),
                matched_params,
            });
        }
    }
    results
}

/// Match a whole session's candidates, preserving input order.
pub fn match_all(candidates: &[TrackingCandidate], catalog: &Catalog) -> Vec<MatchResult> {
    candidates
        .iter()
        .flat_map(|c| match_candidate(c, catalog))
        .collect()
}

/// `None` when a required param is missing or empty; otherwise the evidence
/// subset of the candidate's parameters.
fn collect_params(
    candidate: &TrackingCandidate,
    def: &TrackingDefinition,
) -> Option<BTreeMap<String, String>> {
    let mut matched = BTreeMap::new();
    for key in &def.required_params {
        match candidate.params.get(key) {
            Some(value) if !value.is_empty() => {
                matched.insert(key.clone(), value.clone());
            }
            _ => return None,
        }
    }
    for key in &def.optional_params {
        if let Some(value) = candidate.params.get(key) {
            matched.insert(key.clone(), value.clone());
        }
    }
    Some(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::Catalog;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
[[definition]]
id = "login_click"
required_params = ["uid"]
optional_params = ["src"]
rule = { kind = "path_prefix", prefix = "/track/login" }

[[definition]]
id = "any_track"
rule = { kind = "path_prefix", prefix = "/track" }
"#,
        )
        .unwrap()
    }

    fn candidate(path: &str, params: &[(&str, &str)]) -> TrackingCandidate {
        TrackingCandidate {
            timestamp: 10_000,
            method: "GET".to_string(),
            host: "t.example.com".to_string(),
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            url: String::new(),
        }
    }

    #[test]
    fn test_multiple_definitions_can_match_one_candidate() {
        let results = match_candidate(&candidate("/track/login", &[("uid", "42")]), &catalog());
        let ids: Vec<&str> = results.iter().map(|r| r.definition_id.as_str()).collect();
        assert_eq!(ids, vec!["login_click", "any_track"]);
    }

    #[test]
    fn test_empty_required_param_value_fails_match() {
        let results = match_candidate(&candidate("/track/login", &[("uid", "")]), &catalog());
        let ids: Vec<&str> = results.iter().map(|r| r.definition_id.as_str()).collect();
        // Required param present but empty fails login_click; the looser
        // definition still fires.
        assert_eq!(ids, vec!["any_track"]);
    }

    #[test]
    fn test_matched_params_capture_only_named_keys() {
        let results = match_candidate(
            &candidate("/track/login", &[("uid", "42"), ("src", "app"), ("noise", "x")]),
            &catalog(),
        );
        let login = &results[0];
        assert_eq!(login.matched_params.len(), 2);
        assert_eq!(login.matched_params.get("uid").map(String::as_str), Some("42"));
        assert_eq!(login.matched_params.get("src").map(String::as_str), Some("app"));
        assert!(!login.matched_params.contains_key("noise"));
    }

    #[test]
    fn test_non_matching_candidate_dropped_silently() {
        let results = match_candidate(&candidate("/api/v1/user", &[]), &catalog());
        assert!(results.is_empty());
    }

    #[test]
    fn test_match_is_order_independent() {
        // Reversing catalog declaration order changes result order, never
        // which definitions match.
        let reversed = Catalog::from_toml_str(
            r#"
[[definition]]
id = "any_track"
rule = { kind = "path_prefix", prefix = "/track" }

[[definition]]
id = "login_click"
required_params = ["uid"]
optional_params = ["src"]
rule = { kind = "path_prefix", prefix = "/track/login" }
"#,
        )
        .unwrap();

        let c = candidate("/track/login", &[("uid", "42")]);
        let mut a: Vec<String> = match_candidate(&c, &catalog())
            .into_iter()
            .map(|r| r.definition_id)
            .collect();
        let mut b: Vec<String> = match_candidate(&c, &reversed)
            .into_iter()
            .map(|r| r.definition_id)
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
