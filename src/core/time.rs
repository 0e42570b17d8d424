//! Stamps for journal lines and `--format json` envelopes.
//!
//! Journal events get a ULID so two saves in the same second still sort
//! and dedupe; envelopes only carry the coarse `<secs>Z` stamp.

use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Unix seconds with a `Z` suffix, e.g. `1771220592Z`.
pub fn now_epoch_z() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// `{ts, cmd, status}` followed by the command's own fields. A non-object
/// `extra` is ignored; keys in `extra` win over the base ones.
pub fn command_envelope(cmd: &str, status: &str, extra: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("ts".to_string(), Value::String(now_epoch_z()));
    envelope.insert("cmd".to_string(), Value::String(cmd.to_string()));
    envelope.insert("status".to_string(), Value::String(status.to_string()));
    if let Value::Object(fields) = extra {
        envelope.extend(fields);
    }
    Value::Object(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn epoch_stamp_is_seconds_then_z() {
        let stamp = now_epoch_z();
        let secs: u64 = stamp.strip_suffix('Z').unwrap().parse().unwrap();
        assert!(secs > 1_600_000_000);
    }

    #[test]
    fn event_ids_are_distinct_ulids() {
        let a = new_event_id();
        let b = new_event_id();
        assert_ne!(a, b);
        assert!(Ulid::from_string(&a).is_ok());
    }

    #[test]
    fn envelope_carries_record_and_diagnostics() {
        let envelope = command_envelope(
            "add",
            "ok",
            json!({ "record": { "id": "S1000", "grade": "B" }, "diagnostics": [] }),
        );
        assert_eq!(envelope["cmd"], "add");
        assert_eq!(envelope["status"], "ok");
        assert_eq!(envelope["record"]["id"], "S1000");
        assert!(envelope["diagnostics"].as_array().unwrap().is_empty());
        assert!(envelope["ts"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn non_object_extra_is_ignored() {
        let envelope = command_envelope("stats", "ok", json!(["ignored"]));
        assert_eq!(envelope.as_object().unwrap().len(), 3);
    }
}
