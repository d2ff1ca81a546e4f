//! Session Time
//!
//! Wall-clock timestamps for capture and traversal logs, kept as integer
//! milliseconds since the Unix epoch. Upstream producers write timestamps
//! either as epoch milliseconds (possibly fractional) or as ISO-8601 strings
//! with or without a UTC offset; everything parses down to `Millis` before
//! analysis begins.

/// Milliseconds since Unix epoch (1970-01-01 00:00:00 UTC).
/// i64 covers ~292 million years of range, signed so gaps subtract cleanly.
pub type Millis = i64;

/// Conversion constants
pub const MILLIS_PER_SEC: i64 = 1_000;
pub const MILLIS_PER_MIN: i64 = 60 * MILLIS_PER_SEC;

/// Parse a timestamp string to `Millis`.
///
/// Accepts RFC 3339 ("2024-05-02T10:11:12.123+08:00"), naive ISO-8601
/// ("2024-05-02T10:11:12.123456", interpreted as UTC), and plain integer or
/// fractional epoch milliseconds. Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<Millis> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc).timestamp_millis());
    }
    if let Ok(naive) = s.parse::<chrono::NaiveDateTime>() {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(ms) = s.parse::<f64>() {
        return Some(ms as i64);
    }
    None
}

/// Convert `Millis` to a chrono DateTime for display.
#[inline]
pub fn millis_to_datetime(ms: Millis) -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc
        .timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default()
}

/// Render `Millis` as an RFC 3339 string (millisecond precision).
pub fn format_millis(ms: Millis) -> String {
    millis_to_datetime(ms).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Deserialize a `Millis` field that may arrive as an integer, a float, or a
/// timestamp string.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<Millis, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TsValue {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match TsValue::deserialize(deserializer)? {
        TsValue::Int(ms) => Ok(ms),
        TsValue::Float(ms) => Ok(ms as i64),
        TsValue::Text(s) => parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unparsable timestamp: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let ms = parse_timestamp("1970-01-01T00:00:01.500Z").unwrap();
        assert_eq!(ms, 1_500);
    }

    #[test]
    fn test_parse_naive_iso() {
        // Naive ISO strings (no offset) are read as UTC.
        let ms = parse_timestamp("1970-01-01T00:00:02.250").unwrap();
        assert_eq!(ms, 2_250);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_timestamp("12345"), Some(12_345));
        assert_eq!(parse_timestamp("12345.75"), Some(12_345));
        assert_eq!(parse_timestamp("not a time"), None);
    }

    #[test]
    fn test_format_roundtrip() {
        let ms = 1_700_000_000_123;
        assert_eq!(parse_timestamp(&format_millis(ms)), Some(ms));
    }
}
