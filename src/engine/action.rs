//! UI Action Log
//!
//! One record per gesture the traversal driver issued while walking the app:
//! taps, swipes, text input, back presses, and the initial launch. The log is
//! append-only with strictly increasing `seq` and non-decreasing timestamps;
//! both are validated before correlation (see `correlate`).
//!
//! The reader is tolerant: an unparsable line is logged and skipped rather
//! than aborting the session, since one corrupt record must not invalidate
//! the rest of the traversal evidence.

use crate::engine::clock::{deserialize_millis, Millis};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::warn;

/// The gesture kinds the traversal driver emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Tap,
    Swipe,
    Input,
    Back,
    Launch,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Tap => "tap",
            Self::Swipe => "swipe",
            Self::Input => "input",
            Self::Back => "back",
            Self::Launch => "launch",
        };
        f.write_str(s)
    }
}

/// A single UI action performed during the traversal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiAction {
    /// Issue order within the session, strictly increasing.
    #[serde(alias = "sequence_index")]
    pub seq: u64,
    /// When the gesture was issued (epoch ms).
    #[serde(deserialize_with = "deserialize_millis")]
    pub timestamp: Millis,
    /// Screen/activity identifier the driver was on.
    #[serde(default, alias = "screen_id")]
    pub screen: String,
    /// Gesture kind.
    #[serde(alias = "action_type")]
    pub action: ActionKind,
    /// Label of the element acted on (text, content description, or class).
    #[serde(default, alias = "element_label")]
    pub label: String,
}

/// Read a UI action log (one JSON record per line).
///
/// Blank lines are ignored; lines that fail to parse are skipped with a
/// warning. I/O failure is the only hard error.
pub fn read_action_log<R: BufRead>(reader: R) -> std::io::Result<Vec<UiAction>> {
    let mut actions = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<UiAction>(trimmed) {
            Ok(action) => actions.push(action),
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed UI action record");
            }
        }
    }
    Ok(actions)
}

/// Read a UI action log from a file path.
pub fn load_action_log(path: &std::path::Path) -> std::io::Result<Vec<UiAction>> {
    let file = std::fs::File::open(path)?;
    read_action_log(std::io::BufReader::new(file))
}
