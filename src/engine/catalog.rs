//! Tracking Catalog
//!
//! The expected tracking points for a session: each definition pairs an id
//! with a match rule and the parameters the emitted request must carry. The
//! catalog is loaded once from a TOML document, validated wholesale, and
//! immutable for the run. Every stage receives it by reference, so a test
//! can construct a small catalog inline.
//!
//! Match rules are data, not code: a small closed set of predicate variants
//! over host/path/params, composable with `all`/`any`, evaluated
//! recursively.
//!
//! # Catalog format
//!
//! ```toml
//! [[definition]]
//! id = "login_click"
//! description = "login button tap"
//! required_params = ["uid"]
//! optional_params = ["src"]
//! rule = { kind = "path_prefix", prefix = "/track/login" }
//!
//! [[definition]]
//! id = "home_impression"
//! rule = { kind = "all", rules = [
//!     { kind = "host", host = "t.example.com" },
//!     { kind = "param_equals", key = "event", value = "impression" },
//! ] }
//! ```

use crate::engine::normalize::TrackingCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Predicate over a candidate's host, path, and merged parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchRule {
    /// Exact host match, case-insensitive.
    Host { host: String },
    /// Path starts with the given prefix. Case-sensitive.
    PathPrefix { prefix: String },
    /// Path equals exactly. Case-sensitive.
    ExactPath { path: String },
    /// Parameter key present with a non-empty value.
    ParamPresent { key: String },
    /// Parameter key present with exactly the given value.
    ParamEquals { key: String, value: String },
    /// Every sub-rule holds.
    All { rules: Vec<MatchRule> },
    /// At least one sub-rule holds.
    Any { rules: Vec<MatchRule> },
}

impl MatchRule {
    /// Evaluate this rule against a candidate.
    pub fn eval(&self, candidate: &TrackingCandidate) -> bool {
        match self {
            Self::Host { host } => candidate.host.eq_ignore_ascii_case(host),
            Self::PathPrefix { prefix } => candidate.path.starts_with(prefix.as_str()),
            Self::ExactPath { path } => candidate.path == *path,
            Self::ParamPresent { key } => candidate
                .params
                .get(key)
                .map(|v| !v.is_empty())
                .unwrap_or(false),
            Self::ParamEquals { key, value } => {
                candidate.params.get(key).map(String::as_str) == Some(value.as_str())
            }
            Self::All { rules } => rules.iter().all(|r| r.eval(candidate)),
            Self::Any { rules } => rules.iter().any(|r| r.eval(candidate)),
        }
    }

    /// Structural validation: empty predicates and empty composites are
    /// authoring mistakes, rejected at load.
    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Host { host } => {
                if host.is_empty() {
                    return Err("host rule with empty host".to_string());
                }
            }
            Self::PathPrefix { prefix } => {
                if prefix.is_empty() {
                    return Err("path_prefix rule with empty prefix".to_string());
                }
            }
            Self::ExactPath { path } => {
                if path.is_empty() {
                    return Err("exact_path rule with empty path".to_string());
                }
            }
            Self::ParamPresent { key } | Self::ParamEquals { key, .. } => {
                if key.is_empty() {
                    return Err("param rule with empty key".to_string());
                }
            }
            Self::All { rules } | Self::Any { rules } => {
                if rules.is_empty() {
                    return Err("empty composite rule".to_string());
                }
                for rule in rules {
                    rule.validate()?;
                }
            }
        }
        Ok(())
    }
}

/// One expected tracking point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDefinition {
    /// Unique within the catalog.
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Host/path/param predicate; see [`MatchRule`].
    pub rule: MatchRule,
    /// Parameter keys that must be present with non-empty values for a
    /// candidate to count as this tracking point.
    #[serde(default)]
    pub required_params: Vec<String>,
    /// Additional parameter keys captured into the match evidence when
    /// present; their absence does not block the match.
    #[serde(default)]
    pub optional_params: Vec<String>,
}

/// Catalog load/validation failure. Fatal to the run: an invalid catalog
/// makes every subsequent coverage number meaningless.
#[derive(Debug)]
pub enum CatalogError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    EmptyCatalog,
    DuplicateId {
        id: String,
    },
    InvalidDefinition {
        id: String,
        reason: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read catalog {}: {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "malformed catalog document: {}", e),
            Self::EmptyCatalog => write!(f, "catalog defines no tracking points"),
            Self::DuplicateId { id } => write!(f, "duplicate definition id: {:?}", id),
            Self::InvalidDefinition { id, reason } => {
                write!(f, "invalid definition {:?}: {}", id, reason)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default, rename = "definition")]
    definitions: Vec<TrackingDefinition>,
}

/// The validated, immutable set of tracking-point definitions for one run.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<TrackingDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-parsed definitions, validating wholesale.
    pub fn new(definitions: Vec<TrackingDefinition>) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if def.id.is_empty() {
                return Err(CatalogError::InvalidDefinition {
                    id: def.id.clone(),
                    reason: "empty id".to_string(),
                });
            }
            if index.insert(def.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId {
                    id: def.id.clone(),
                });
            }
            def.rule
                .validate()
                .map_err(|reason| CatalogError::InvalidDefinition {
                    id: def.id.clone(),
                    reason,
                })?;
            for key in def.required_params.iter().chain(&def.optional_params) {
                if key.is_empty() {
                    return Err(CatalogError::InvalidDefinition {
                        id: def.id.clone(),
                        reason: "empty parameter key".to_string(),
                    });
                }
            }
        }
        Ok(Self { definitions, index })
    }

    /// Parse and validate a TOML catalog document.
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = toml::from_str(source).map_err(CatalogError::Parse)?;
        Self::new(doc.definitions)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let source = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// All definitions, in declaration order.
    pub fn definitions(&self) -> &[TrackingDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: &str) -> Option<&TrackingDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions whose rule holds for the candidate, in declaration order
    /// so match output is reproducible given the same catalog.
    pub fn lookup_candidates<'a>(
        &'a self,
        candidate: &'a TrackingCandidate,
    ) -> impl Iterator<Item = &'a TrackingDefinition> {
        self.definitions.iter().filter(|def| def.rule.eval(candidate))
    }
}
