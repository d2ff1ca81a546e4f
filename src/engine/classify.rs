//! Domain Classification
//!
//! Sorts captured hosts into tracking, business, and noise traffic using
//! glob-style domain patterns. Classification feeds session statistics; it
//! does not gate catalog matching, so a tracking point on an unlisted
//! domain still matches its definition.
//!
//! Precedence: tracking patterns win, then noise, then business; an
//! unmatched host is noise (conservative default, since most mobile traffic
//! is neither business nor analytics).

use glob::Pattern;
use serde::Serialize;
use std::fmt;

/// What a captured host looks like to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficClass {
    /// Analytics/tracking endpoint traffic.
    Tracking,
    /// The app's own product traffic.
    Business,
    /// CDNs, third-party SDKs, ads. Filtered from analysis attention.
    Noise,
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tracking => "tracking",
            Self::Business => "business",
            Self::Noise => "noise",
        };
        f.write_str(s)
    }
}

/// A domain pattern that failed to compile at config load.
#[derive(Debug)]
pub struct InvalidPatternError {
    pub pattern: String,
    pub source: glob::PatternError,
}

impl fmt::Display for InvalidPatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid domain pattern {:?}: {}", self.pattern, self.source)
    }
}

impl std::error::Error for InvalidPatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone)]
struct DomainPattern {
    compiled: Pattern,
    /// Pattern with wildcards stripped, for the loose substring fallback
    /// applied to tracking and business lists.
    stem: String,
}

impl DomainPattern {
    fn compile(raw: &str) -> Result<Self, InvalidPatternError> {
        let lowered = raw.to_ascii_lowercase();
        let compiled = Pattern::new(&lowered).map_err(|source| InvalidPatternError {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Self {
            compiled,
            stem: lowered.replace('*', ""),
        })
    }

    fn matches(&self, host: &str) -> bool {
        self.compiled.matches(host)
    }

    fn matches_loose(&self, host: &str) -> bool {
        self.compiled.matches(host) || (!self.stem.is_empty() && host.contains(self.stem.as_str()))
    }
}

fn compile_all(raw: &[String]) -> Result<Vec<DomainPattern>, InvalidPatternError> {
    raw.iter().map(|p| DomainPattern::compile(p)).collect()
}

/// Compiled classifier over the three configured pattern lists.
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    tracking: Vec<DomainPattern>,
    business: Vec<DomainPattern>,
    noise: Vec<DomainPattern>,
}

impl DomainClassifier {
    pub fn new(
        tracking: &[String],
        business: &[String],
        noise: &[String],
    ) -> Result<Self, InvalidPatternError> {
        Ok(Self {
            tracking: compile_all(tracking)?,
            business: compile_all(business)?,
            noise: compile_all(noise)?,
        })
    }

    /// Classify a host. Case-insensitive; patterns were lowercased at
    /// compile time.
    pub fn classify(&self, host: &str) -> TrafficClass {
        let host = host.to_ascii_lowercase();
        if self.tracking.iter().any(|p| p.matches_loose(&host)) {
            return TrafficClass::Tracking;
        }
        if self.noise.iter().any(|p| p.matches(&host)) {
            return TrafficClass::Noise;
        }
        if self.business.iter().any(|p| p.matches_loose(&host)) {
            return TrafficClass::Business;
        }
        TrafficClass::Noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn classifier() -> DomainClassifier {
        DomainClassifier::new(
            &strings(&["dc.analytics.example.com", "*.apm.example.com"]),
            &strings(&["*.example.com", "*shop*"]),
            &strings(&["*.cdn.example.com", "*.googleapis.com"]),
        )
        .unwrap()
    }

    #[test]
    fn test_tracking_beats_noise_and_business() {
        let c = classifier();
        assert_eq!(c.classify("dc.analytics.example.com"), TrafficClass::Tracking);
        assert_eq!(c.classify("a.apm.example.com"), TrafficClass::Tracking);
    }

    #[test]
    fn test_noise_beats_business() {
        let c = classifier();
        assert_eq!(c.classify("img.cdn.example.com"), TrafficClass::Noise);
        assert_eq!(c.classify("fonts.googleapis.com"), TrafficClass::Noise);
    }

    #[test]
    fn test_business_and_loose_substring() {
        let c = classifier();
        assert_eq!(c.classify("api.example.com"), TrafficClass::Business);
        // Stripped-wildcard substring fallback applies to business patterns.
        assert_eq!(c.classify("m.shop-gateway.net"), TrafficClass::Business);
    }

    #[test]
    fn test_unmatched_host_is_noise() {
        assert_eq!(classifier().classify("unknown.net"), TrafficClass::Noise);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(
            classifier().classify("DC.Analytics.Example.COM"),
            TrafficClass::Tracking
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = DomainClassifier::new(&strings(&["[bad"]), &[], &[]);
        assert!(err.is_err());
    }
}
