//! Capture Log
//!
//! Raw HTTP transactions as written by the capture proxy: one JSON record per
//! line with a timestamp, method, full URL, and an optional decoded body.
//! Extra fields the proxy emits (host, path, session id, action gap) are
//! ignored here; normalization re-derives everything from the URL.
//!
//! Reader guarantees:
//! - Static-asset requests (images, video, stylesheets, fonts) are dropped,
//!   the same filter the proxy applies, so logs written without it still
//!   come out clean.
//! - An unparsable line degrades to an empty record carrying the previous
//!   record's timestamp, so it still flows through the pipeline as a
//!   candidate that matches nothing and cannot fake an ordering violation.

use crate::engine::clock::{deserialize_millis, Millis};
use serde::Deserialize;
use std::io::BufRead;
use tracing::warn;

/// One observed HTTP transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    /// When the proxy saw the request (epoch ms).
    pub timestamp: Millis,
    /// HTTP method, as captured.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Decoded request body, if any. The proxy writes JSON bodies as JSON
    /// values and everything else as a string.
    pub body: Option<serde_json::Value>,
}

impl RawCapture {
    /// The degraded shape a malformed log line collapses to. Matches nothing
    /// downstream but keeps the record count and ordering intact.
    pub fn degraded(timestamp: Millis) -> Self {
        Self {
            timestamp,
            method: String::new(),
            url: String::new(),
            body: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.url.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawCaptureRecord {
    #[serde(deserialize_with = "deserialize_millis")]
    timestamp: Millis,
    #[serde(default)]
    method: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

/// Substring check against the configured static-asset extensions, the same
/// rule the capture proxy applies before writing a record.
pub fn is_static_asset(url: &str, asset_extensions: &[String]) -> bool {
    asset_extensions.iter().any(|ext| url.contains(ext.as_str()))
}

/// Read a capture log (one JSON record per line).
///
/// Returns records in file order. Only I/O failure is a hard error; damaged
/// lines degrade (see module docs) and asset requests are filtered out.
pub fn read_capture_log<R: BufRead>(
    reader: R,
    asset_extensions: &[String],
) -> std::io::Result<Vec<RawCapture>> {
    let mut captures = Vec::new();
    let mut last_ts: Millis = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawCaptureRecord>(trimmed) {
            Ok(rec) => {
                if is_static_asset(&rec.url, asset_extensions) {
                    continue;
                }
                last_ts = rec.timestamp;
                captures.push(RawCapture {
                    timestamp: rec.timestamp,
                    method: rec.method,
                    url: rec.url,
                    body: rec.body,
                });
            }
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "degrading malformed capture record");
                captures.push(RawCapture::degraded(last_ts));
            }
        }
    }
    Ok(captures)
}

/// Read a capture log from a file path.
pub fn load_capture_log(
    path: &std::path::Path,
    asset_extensions: &[String],
) -> std::io::Result<Vec<RawCapture>> {
    let file = std::fs::File::open(path)?;
    read_capture_log(std::io::BufReader::new(file), asset_extensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec![".png".to_string(), ".css".to_string()]
    }

    #[test]
    fn test_read_capture_log() {
        let log = r#"
{"timestamp": 1000, "method": "GET", "url": "https://t.example.com/track?e=1"}
{"timestamp": 2000, "method": "POST", "url": "https://api.example.com/v1/login", "body": {"uid": "42"}}
"#;
        let captures = read_capture_log(log.as_bytes(), &exts()).unwrap();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].method, "GET");
        assert!(captures[1].body.is_some());
    }

    #[test]
    fn test_asset_requests_dropped() {
        let log = r#"
{"timestamp": 1000, "method": "GET", "url": "https://cdn.example.com/logo.png"}
{"timestamp": 1500, "method": "GET", "url": "https://t.example.com/track?e=1"}
"#;
        let captures = read_capture_log(log.as_bytes(), &exts()).unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].timestamp, 1500);
    }

    #[test]
    fn test_damaged_line_degrades_with_carried_timestamp() {
        let log = "{\"timestamp\": 1000, \"url\": \"https://a.example.com/x\"}\n%%garbage%%\n{\"timestamp\": 3000, \"url\": \"https://a.example.com/y\"}\n";
        let captures = read_capture_log(log.as_bytes(), &exts()).unwrap();
        assert_eq!(captures.len(), 3);
        assert!(captures[1].is_degraded());
        // Carried forward: cannot manufacture an ordering violation.
        assert_eq!(captures[1].timestamp, 1000);
        assert_eq!(captures[2].timestamp, 3000);
    }

    #[test]
    fn test_string_timestamp_accepted() {
        let log = r#"{"timestamp": "1970-01-01T00:00:05Z", "url": "https://a.example.com/x"}"#;
        let captures = read_capture_log(log.as_bytes(), &exts()).unwrap();
        assert_eq!(captures[0].timestamp, 5_000);
    }
}
