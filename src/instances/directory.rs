//! Parsing of the global instance directory payload.
//!
//! The directory is an array of `[name, info]` tuples. Entries that are
//! malformed or do not advertise API support are skipped one by one; only a
//! payload that is unreadable as a whole fails the refresh.

use super::models::Instance;
use crate::upstream::FetchError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DirectoryInfo {
    #[serde(default)]
    api: Option<bool>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    monitor: Option<Monitor>,
}

#[derive(Debug, Deserialize)]
struct Monitor {
    #[serde(default, rename = "90dRatio")]
    ratio_90d: Option<RatioWrapper>,
}

#[derive(Debug, Deserialize)]
struct RatioWrapper {
    #[serde(default)]
    ratio: Option<Value>,
}

/// Build instances from the directory payload, keeping only entries that
/// advertise API support.
pub fn parse_directory(payload: &Value) -> Result<Vec<Instance>, FetchError> {
    let entries = payload
        .as_array()
        .ok_or_else(|| FetchError::Parse("directory payload is not an array".into()))?;

    let mut instances = Vec::new();
    for entry in entries {
        match parse_entry(entry) {
            Some(instance) => instances.push(instance),
            None => debug!("skipping directory entry: {}", entry),
        }
    }
    Ok(instances)
}

fn parse_entry(entry: &Value) -> Option<Instance> {
    let tuple = entry.as_array()?;
    let name = tuple.first()?.as_str()?.to_string();
    let info: DirectoryInfo = serde_json::from_value(tuple.get(1)?.clone()).ok()?;
    if info.api != Some(true) {
        return None;
    }

    let kind = info.kind.unwrap_or_default();
    let enabled = kind == "https";
    let directory_health = info
        .monitor
        .and_then(|m| m.ratio_90d)
        .and_then(|r| r.ratio)
        .and_then(|v| ratio_value(&v))
        .unwrap_or(0.0);

    Some(Instance {
        name,
        base_url: info.uri.unwrap_or_default(),
        kind,
        region: info.region.unwrap_or_default(),
        api_enabled: true,
        enabled,
        banned: false,
        directory_health,
        updated: false,
        cooldown_until: 0,
        next_popular_refresh_at: 0,
    })
}

// Monitors report the ratio either as a number or as a string like "99.87".
fn ratio_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_less_entries_are_dropped() {
        let payload = json!([
            ["a.com", {"api": true, "type": "https", "uri": "https://a.com", "region": "US"}],
            ["b.com", {"api": null}],
        ]);

        let instances = parse_directory(&payload).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "a.com");
        assert!(instances[0].enabled);
        assert!(instances[0].api_enabled);
    }

    #[test]
    fn test_non_https_entries_are_disabled() {
        let payload = json!([
            ["t.onion", {"api": true, "type": "onion", "uri": "http://t.onion"}],
        ]);

        let instances = parse_directory(&payload).unwrap();
        assert_eq!(instances.len(), 1);
        assert!(!instances[0].enabled);
        assert_eq!(instances[0].kind, "onion");
    }

    #[test]
    fn test_health_from_string_or_number() {
        let payload = json!([
            ["a.com", {"api": true, "type": "https",
                       "monitor": {"90dRatio": {"ratio": "99.87"}}}],
            ["b.com", {"api": true, "type": "https",
                       "monitor": {"90dRatio": {"ratio": 100.0}}}],
            ["c.com", {"api": true, "type": "https"}],
        ]);

        let instances = parse_directory(&payload).unwrap();
        assert!((instances[0].directory_health - 99.87).abs() < 1e-9);
        assert!((instances[1].directory_health - 100.0).abs() < 1e-9);
        assert_eq!(instances[2].directory_health, 0.0);
    }

    #[test]
    fn test_malformed_entry_is_skipped_not_fatal() {
        let payload = json!([
            "not-a-tuple",
            [42, {"api": true}],
            ["ok.com", {"api": true, "type": "https"}],
        ]);

        let instances = parse_directory(&payload).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "ok.com");
    }

    #[test]
    fn test_non_array_payload_is_an_error() {
        let payload = json!({"unexpected": "shape"});
        assert!(matches!(
            parse_directory(&payload),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_fresh_entries_start_unannotated() {
        let payload = json!([["a.com", {"api": true, "type": "https"}]]);
        let instances = parse_directory(&payload).unwrap();
        assert!(!instances[0].updated);
        assert!(!instances[0].banned);
        assert_eq!(instances[0].cooldown_until, 0);
        assert_eq!(instances[0].next_popular_refresh_at, 0);
    }
}
