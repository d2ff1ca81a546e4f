//! Embedded Event Extraction
//!
//! Analytics SDKs batch events inside request bodies, often several levels
//! deep and sometimes with the params mapping JSON-encoded as a string. This
//! walks a body recursively and pulls out every `{"event": ..., "params":
//! ...}` node it finds, recording the JSON path for the report.
//!
//! Extraction never fails; nodes that don't look like events contribute
//! nothing.

use serde_json::Value;
use std::collections::BTreeMap;

/// One analytics event found inside a request body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EmbeddedEvent {
    pub name: String,
    pub params: BTreeMap<String, String>,
    /// Dotted path of the node within the body, e.g. `batch[2].payload`.
    pub json_path: String,
}

/// Recursively extract all embedded events from a request body.
pub fn extract_events(body: &Value) -> Vec<EmbeddedEvent> {
    let mut events = Vec::new();
    walk(body, String::new(), &mut events);
    events
}

fn walk(value: &Value, path: String, out: &mut Vec<EmbeddedEvent>) {
    match value {
        Value::Object(map) => {
            if let Some(name) = map.get("event") {
                let name = name
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| "unknown".to_string());
                out.push(EmbeddedEvent {
                    name,
                    params: event_params(map.get("params")),
                    json_path: path.clone(),
                });
            }
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(child, child_path, out);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                walk(item, format!("{}[{}]", path, idx), out);
            }
        }
        _ => {}
    }
}

/// Flatten an event's params value, accepting a JSON-encoded string.
fn event_params(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), param_to_string(v)))
            .collect(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), param_to_string(v)))
                .collect(),
            _ => {
                let mut params = BTreeMap::new();
                params.insert("_raw".to_string(), text.clone());
                params
            }
        },
        _ => BTreeMap::new(),
    }
}

fn param_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_top_level_event() {
        let body = json!({"event": "click", "params": {"uid": "42", "count": 3}});
        let events = extract_events(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "click");
        assert_eq!(events[0].params.get("uid").map(String::as_str), Some("42"));
        assert_eq!(events[0].params.get("count").map(String::as_str), Some("3"));
        assert_eq!(events[0].json_path, "");
    }

    #[test]
    fn test_extract_nested_batch() {
        let body = json!({
            "meta": {"sdk": "1.2"},
            "batch": [
                {"event": "impression", "params": {"page": "home"}},
                {"payload": {"event": "click", "params": {"page": "home"}}}
            ]
        });
        let events = extract_events(&body);
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["impression", "click"]);
        assert_eq!(events[0].json_path, "batch[0]");
        assert_eq!(events[1].json_path, "batch[1].payload");
    }

    #[test]
    fn test_extract_stringified_params() {
        let body = json!({"event": "view", "params": "{\"screen\": \"settings\"}"});
        let events = extract_events(&body);
        assert_eq!(
            events[0].params.get("screen").map(String::as_str),
            Some("settings")
        );
    }

    #[test]
    fn test_unparsable_params_kept_raw() {
        let body = json!({"event": "view", "params": "not json"});
        let events = extract_events(&body);
        assert_eq!(
            events[0].params.get("_raw").map(String::as_str),
            Some("not json")
        );
    }

    #[test]
    fn test_non_string_event_name_is_unknown() {
        let body = json!({"event": 7});
        let events = extract_events(&body);
        assert_eq!(events[0].name, "unknown");
    }

    #[test]
    fn test_no_events() {
        assert!(extract_events(&json!({"data": [1, 2, 3]})).is_empty());
        assert!(extract_events(&json!("plain string")).is_empty());
    }
}
