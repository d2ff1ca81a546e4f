//! Timeline Correlator
//!
//! Aligns each match result to the UI action that plausibly caused it: the
//! latest action at or before the request, within a tolerance window. Both
//! input streams must already be time-sorted; the correlator validates this
//! and fails fast rather than silently producing misleading correlations.
//!
//! The cursor over UI actions only advances forward, so a full pass is
//! linear in the combined size of both streams. That shape is deliberately
//! incremental: a streaming consumer could feed the same cursor without
//! redesign.

use crate::engine::action::UiAction;
use crate::engine::clock::Millis;
use crate::engine::matcher::MatchResult;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Ordering precondition violation in an input stream. Fatal: correlation
/// over an unsorted log is meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrderError {
    /// Timestamps regressed between adjacent records.
    TimestampRegression {
        stream: &'static str,
        index: usize,
        prev: Millis,
        curr: Millis,
    },
    /// UI action sequence indices failed to strictly increase.
    SequenceRegression {
        index: usize,
        prev: u64,
        curr: u64,
    },
}

impl fmt::Display for InputOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampRegression {
                stream,
                index,
                prev,
                curr,
            } => write!(
                f,
                "{} log not time-sorted at record {}: {} after {}",
                stream, index, curr, prev
            ),
            Self::SequenceRegression { index, prev, curr } => write!(
                f,
                "ui action log sequence not strictly increasing at record {}: {} after {}",
                index, curr, prev
            ),
        }
    }
}

impl std::error::Error for InputOrderError {}

/// Check that timestamps are non-decreasing, naming the offending record.
pub fn check_time_sorted<T>(
    stream: &'static str,
    items: &[T],
    timestamp: impl Fn(&T) -> Millis,
) -> Result<(), InputOrderError> {
    for (index, window) in items.windows(2).enumerate() {
        let prev = timestamp(&window[0]);
        let curr = timestamp(&window[1]);
        if curr < prev {
            return Err(InputOrderError::TimestampRegression {
                stream,
                index: index + 1,
                prev,
                curr,
            });
        }
    }
    Ok(())
}

/// Check that UI action sequence indices strictly increase.
pub fn check_seq_strictly_increasing(actions: &[UiAction]) -> Result<(), InputOrderError> {
    for (index, window) in actions.windows(2).enumerate() {
        if window[1].seq <= window[0].seq {
            return Err(InputOrderError::SequenceRegression {
                index: index + 1,
                prev: window[0].seq,
                curr: window[1].seq,
            });
        }
    }
    Ok(())
}

/// A match result tied to the UI action presumed to have caused it.
///
/// `ui_action` is `None` when no action falls within the tolerance window
/// before the request; the event still counts as fired, flagged
/// uncorrelated. `gap_ms` is populated exactly when `ui_action` is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedEvent {
    #[serde(rename = "match")]
    pub match_result: MatchResult,
    pub ui_action: Option<UiAction>,
    pub gap_ms: Option<Millis>,
}

impl CorrelatedEvent {
    #[inline]
    pub fn is_correlated(&self) -> bool {
        self.ui_action.is_some()
    }

    #[inline]
    pub fn timestamp(&self) -> Millis {
        self.match_result.timestamp()
    }
}

/// Correlate time-sorted match results against time-sorted UI actions.
///
/// For each match at time `t`, selects the action with the greatest
/// `timestamp <= t` such that `t - timestamp <= tolerance_ms` (inclusive
/// boundary). Equal-timestamp actions tie-break toward the larger `seq`,
/// the most recently issued gesture. Every match within tolerance of the
/// same action correlates to it independently: a single tap firing both an
/// impression and a click yields two correlated events.
pub fn correlate(
    matches: &[MatchResult],
    actions: &[UiAction],
    tolerance_ms: Millis,
) -> Result<Vec<CorrelatedEvent>, InputOrderError> {
    check_time_sorted("match result", matches, |m| m.timestamp())?;
    check_time_sorted("ui action", actions, |a| a.timestamp)?;

    let mut events = Vec::with_capacity(matches.len());
    // Index of the first action not yet at-or-before the current match time.
    let mut cursor = 0usize;

    for m in matches {
        let t = m.timestamp();
        while cursor < actions.len() && actions[cursor].timestamp <= t {
            cursor += 1;
        }

        let chosen = if cursor == 0 {
            None
        } else {
            let last_ts = actions[cursor - 1].timestamp;
            if t - last_ts <= tolerance_ms {
                // Walk back over the run of equal timestamps for the
                // largest seq. Runs are short; the cursor itself never
                // retreats across match results.
                let mut best = &actions[cursor - 1];
                let mut i = cursor - 1;
                while i > 0 && actions[i - 1].timestamp == last_ts {
                    i -= 1;
                    if actions[i].seq > best.seq {
                        best = &actions[i];
                    }
                }
                Some(best)
            } else {
                None
            }
        };

        match chosen {
            Some(action) => events.push(CorrelatedEvent {
                gap_ms: Some(t - action.timestamp),
                ui_action: Some(action.clone()),
                match_result: m.clone(),
            }),
            None => {
                debug!(
                    definition = %m.definition_id,
                    timestamp = t,
                    "no ui action within tolerance; event uncorrelated"
                );
                events.push(CorrelatedEvent {
                    match_result: m.clone(),
                    ui_action: None,
                    gap_ms: None,
                });
            }
        }
    }

    Ok(events)
}
