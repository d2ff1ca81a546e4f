//! Candidate Normalization
//!
//! Turns a `RawCapture` into the canonical `TrackingCandidate` the matcher
//! consumes: lowercased host, path, and one merged parameter mapping built
//! from the URL query string plus whatever the body yields.
//!
//! Normalization is total. A capture with an unparsable URL or body becomes a
//! candidate with empty host/path/params; capture damage degrades the record,
//! it never blocks the analysis.

use crate::engine::capture::RawCapture;
use crate::engine::clock::Millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// A captured request in canonical form, prior to catalog matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingCandidate {
    /// Capture time (epoch ms).
    pub timestamp: Millis,
    /// HTTP method, uppercased.
    pub method: String,
    /// Host, lowercased. Host matching is case-insensitive throughout.
    pub host: String,
    /// URL path. Case is preserved: path segments may be case-sensitive
    /// identifiers.
    pub path: String,
    /// Merged parameters: query string first, then decoded body fields.
    /// Body wins on key collision. Ordered for stable serialization.
    pub params: BTreeMap<String, String>,
    /// The original URL, kept as report evidence.
    pub url: String,
}

/// Normalize a raw capture. Pure and total: never fails, performs no I/O.
pub fn normalize(raw: &RawCapture) -> TrackingCandidate {
    let mut params = BTreeMap::new();
    let (host, path) = match Url::parse(&raw.url) {
        Ok(parsed) => {
            for (key, value) in parsed.query_pairs() {
                params.insert(key.into_owned(), value.into_owned());
            }
            (
                parsed.host_str().unwrap_or_default().to_ascii_lowercase(),
                parsed.path().to_string(),
            )
        }
        Err(_) => (String::new(), String::new()),
    };

    if let Some(body) = &raw.body {
        for (key, value) in body_params(body) {
            params.insert(key, value);
        }
    }

    TrackingCandidate {
        timestamp: raw.timestamp,
        method: raw.method.to_ascii_uppercase(),
        host,
        path,
        params,
        url: raw.url.clone(),
    }
}

/// Extract a flat parameter mapping from a request body.
///
/// JSON objects contribute their top-level scalar fields. String bodies are
/// sniffed: JSON first, then `key=value&...` form encoding. Anything else
/// yields nothing.
fn body_params(body: &Value) -> BTreeMap<String, String> {
    match body {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
            .collect(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{') {
                if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                    return body_params(&parsed);
                }
            }
            if trimmed.contains('=') {
                return url::form_urlencoded::parse(trimmed.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
            }
            BTreeMap::new()
        }
        _ => BTreeMap::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capture(url: &str, body: Option<Value>) -> RawCapture {
        RawCapture {
            timestamp: 1_000,
            method: "post".to_string(),
            url: url.to_string(),
            body,
        }
    }

    #[test]
    fn test_normalize_query_params() {
        let c = normalize(&capture("https://T.Example.com/Track/login?uid=42&src=app", None));
        assert_eq!(c.host, "t.example.com");
        assert_eq!(c.path, "/Track/login");
        assert_eq!(c.method, "POST");
        assert_eq!(c.params.get("uid").map(String::as_str), Some("42"));
        assert_eq!(c.params.get("src").map(String::as_str), Some("app"));
    }

    #[test]
    fn test_normalize_json_body_wins_on_collision() {
        let c = normalize(&capture(
            "https://t.example.com/track?uid=1&page=home",
            Some(json!({"uid": "42", "count": 3, "ok": true, "nested": {"x": 1}})),
        ));
        assert_eq!(c.params.get("uid").map(String::as_str), Some("42"));
        assert_eq!(c.params.get("page").map(String::as_str), Some("home"));
        assert_eq!(c.params.get("count").map(String::as_str), Some("3"));
        assert_eq!(c.params.get("ok").map(String::as_str), Some("true"));
        // Nested objects are not flattened into the parameter mapping.
        assert!(!c.params.contains_key("nested"));
    }

    #[test]
    fn test_normalize_form_encoded_string_body() {
        let c = normalize(&capture(
            "https://t.example.com/track",
            Some(Value::String("event=click&label=login%20button".to_string())),
        ));
        assert_eq!(c.params.get("event").map(String::as_str), Some("click"));
        assert_eq!(c.params.get("label").map(String::as_str), Some("login button"));
    }

    #[test]
    fn test_normalize_json_string_body() {
        let c = normalize(&capture(
            "https://t.example.com/track",
            Some(Value::String(r#"{"event": "view"}"#.to_string())),
        ));
        assert_eq!(c.params.get("event").map(String::as_str), Some("view"));
    }

    #[test]
    fn test_normalize_unknown_body_degrades_to_empty() {
        let c = normalize(&capture(
            "https://t.example.com/track",
            Some(Value::String("just some text".to_string())),
        ));
        assert!(c.params.is_empty());
    }

    #[test]
    fn test_normalize_bad_url_degrades() {
        let c = normalize(&capture("not a url", None));
        assert!(c.host.is_empty());
        assert!(c.path.is_empty());
        assert!(c.params.is_empty());
        assert_eq!(c.timestamp, 1_000);
    }
}
