//! Session Configuration
//!
//! Everything the engine needs beyond the catalog: the correlation tolerance
//! and the domain/asset filters. Loaded from a TOML file; every field has a
//! default, so a missing file or an empty document is a valid configuration.

use crate::engine::classify::{DomainClassifier, InvalidPatternError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Correlation window between a gesture and the request it causes.
    /// Latency profiles vary by app and network, so this is never
    /// hard-coded downstream.
    pub tolerance_ms: i64,
    /// Domains whose traffic is analytics/tracking. Glob patterns.
    pub tracking_domains: Vec<String>,
    /// The app's own product domains. Glob patterns.
    pub business_domains: Vec<String>,
    /// Domains to discount as noise (CDNs, ads, third-party SDKs).
    pub noise_domains: Vec<String>,
    /// URL substrings identifying static assets dropped at read time.
    pub asset_extensions: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // The capture tooling's click-effect window.
            tolerance_ms: 3_000,
            tracking_domains: Vec::new(),
            business_domains: Vec::new(),
            noise_domains: vec![
                "*.googleapis.com".to_string(),
                "*.gstatic.com".to_string(),
                "*.doubleclick.net".to_string(),
                "*cdn*".to_string(),
            ],
            asset_extensions: vec![
                ".jpg".to_string(),
                ".jpeg".to_string(),
                ".png".to_string(),
                ".gif".to_string(),
                ".webp".to_string(),
                ".mp4".to_string(),
                ".css".to_string(),
                ".woff".to_string(),
                ".woff2".to_string(),
            ],
        }
    }
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Pattern(InvalidPatternError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "malformed config document: {}", e),
            Self::Pattern(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Pattern(e) => Some(e),
        }
    }
}

impl SessionConfig {
    /// Parse a TOML config document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(ConfigError::Parse)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Compile the domain classifier from the configured pattern lists.
    pub fn classifier(&self) -> Result<DomainClassifier, ConfigError> {
        DomainClassifier::new(
            &self.tracking_domains,
            &self.business_domains,
            &self.noise_domains,
        )
        .map_err(ConfigError::Pattern)
    }
}
