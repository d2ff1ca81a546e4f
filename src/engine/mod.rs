//! Tracking Coverage Engine
//!
//! Correlation and coverage analysis over one traversal session: which of
//! the expected tracking points actually fired, and which gesture caused
//! each one.
//!
//! # Architecture
//!
//! ```text
//!  capture log (jsonl)          ui action log (jsonl)
//!        │                             │
//!        ▼                             │
//! ┌─────────────┐                      │
//! │ Normalizer  │  RawCapture ->       │
//! │             │  TrackingCandidate   │
//! └──────┬──────┘                      │
//!        ▼                             │
//! ┌─────────────┐   ┌──────────┐       │
//! │  Matcher    │◀──│ Catalog  │       │
//! │             │   │ (TOML)   │       │
//! └──────┬──────┘   └──────────┘       │
//!        ▼                             ▼
//! ┌──────────────────────────────────────┐
//! │ Timeline Correlator (forward cursor) │
//! └──────┬───────────────────────────────┘
//!        ▼
//! ┌─────────────┐    ┌───────────────┐
//! │ Coverage    │    │ SessionStats  │
//! │ Aggregator  │    │ (supplement)  │
//! └──────┬──────┘    └──────┬────────┘
//!        └───────┬──────────┘
//!                ▼
//!          SessionReport (json)
//! ```
//!
//! # Determinism
//!
//! - Catalog iterated in declaration order; parameter and report maps are
//!   ordered (BTree), so identical inputs serialize byte-identically.
//! - Both input logs must be time-sorted; validated up front, never
//!   corrected silently.
//! - No stage reads the system clock or performs I/O.

pub mod action;
pub mod capture;
pub mod catalog;
pub mod classify;
pub mod clock;
pub mod correlate;
pub mod coverage;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod stats;

#[cfg(test)]
mod coverage_tests;

pub use action::{ActionKind, UiAction};
pub use capture::RawCapture;
pub use catalog::{Catalog, CatalogError, MatchRule, TrackingDefinition};
pub use classify::{DomainClassifier, TrafficClass};
pub use clock::Millis;
pub use correlate::{correlate, CorrelatedEvent, InputOrderError};
pub use coverage::{aggregate, CoverageReport, DefinitionCoverage};
pub use matcher::{match_all, match_candidate, MatchResult};
pub use normalize::{normalize, TrackingCandidate};
pub use pipeline::{analyze_session, SessionReport};
pub use stats::SessionStats;
