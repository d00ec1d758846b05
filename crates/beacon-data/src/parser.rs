//! Defensive decoding of Beacon datapoint payloads.
//!
//! Never fails: invalid JSON becomes [`Datapoint::Malformed`], and any field
//! that is missing or has the wrong type takes its default.

use beacon_core::models::{Datapoint, Reading};
use serde_json::Value;
use tracing::debug;

/// Parse one raw payload.
///
/// Reads `status` and `battery_level` at the top level, and `distance`,
/// `moving_time` and `elapsed_time` under `stats`.
pub fn parse_datapoint(raw: &str) -> Datapoint {
    let payload: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "payload is not valid JSON");
            return Datapoint::Malformed;
        }
    };

    let stats = payload.get("stats");
    let stat = |name: &str| stats.and_then(|s| s.get(name));

    Datapoint::Reading(Reading {
        status: status_or_zero(payload.get("status")),
        distance_m: float_or_zero(stat("distance")),
        moving_time_s: integer_or_zero(stat("moving_time")),
        elapsed_time_s: integer_or_zero(stat("elapsed_time")),
        battery_percent: integer_or_zero(payload.get("battery_level")),
    })
}

/// Status code; only integral numbers count, anything else is 0.
///
/// `7.0` is status 7, but `7.9` is not rounded into the continuation set.
fn status_or_zero(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| {
            v.as_i64().or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        })
        .unwrap_or(0)
}

/// Integer field; floats are truncated, anything else is 0.
fn integer_or_zero(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

fn float_or_zero(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::models::StatusCode;

    fn reading(raw: &str) -> Reading {
        match parse_datapoint(raw) {
            Datapoint::Reading(r) => r,
            Datapoint::Malformed => panic!("expected a reading for {raw}"),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        for raw in ["", "{", "not json", "{\"status\": }", "<html>502</html>"] {
            let dp = parse_datapoint(raw);
            assert_eq!(dp, Datapoint::Malformed, "input {raw:?}");
            assert_eq!(dp.status(), StatusCode::Error);
        }
    }

    #[test]
    fn test_empty_object_defaults() {
        let r = reading("{}");
        assert_eq!(r, Reading::default());
        assert_eq!(r.distance_km(), r.distance_m / 1000.0);
        assert_eq!(r.distance_km_whole(), 0);
    }

    #[test]
    fn test_full_payload() {
        let r = reading(
            r#"{"status": 3, "battery_level": 81,
                "stats": {"distance": 15230.7, "moving_time": 3605, "elapsed_time": 4010}}"#,
        );
        assert_eq!(r.status, 3);
        assert_eq!(r.battery_percent, 81);
        assert!((r.distance_m - 15230.7).abs() < 1e-9);
        assert_eq!(r.moving_time_s, 3605);
        assert_eq!(r.elapsed_time_s, 4010);
        assert_eq!(r.distance_km_whole(), 15);
    }

    #[test]
    fn test_integer_distance_accepted() {
        let r = reading(r#"{"stats": {"distance": 2000}}"#);
        assert_eq!(r.distance_m, 2000.0);
        assert_eq!(r.distance_km_whole(), 2);
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let r = reading(
            r#"{"status": "live", "battery_level": null,
                "stats": {"distance": "far", "moving_time": [1], "elapsed_time": {}}}"#,
        );
        assert_eq!(r, Reading::default());
    }

    #[test]
    fn test_stats_not_an_object() {
        let r = reading(r#"{"status": 1, "stats": 42}"#);
        assert_eq!(r.status, 1);
        assert_eq!(r.distance_m, 0.0);
    }

    #[test]
    fn test_non_object_json_defaults() {
        assert_eq!(reading("[1, 2, 3]"), Reading::default());
        assert_eq!(reading("7"), Reading::default());
    }

    #[test]
    fn test_fractional_status_is_not_a_status() {
        for raw in [r#"{"status": 1.5}"#, r#"{"status": 7.9}"#, r#"{"status": 3.2}"#] {
            let dp = parse_datapoint(raw);
            assert_eq!(dp.status(), StatusCode::Code(0), "input {raw}");
            assert!(!dp.status().should_continue(), "input {raw}");
        }
    }

    #[test]
    fn test_integral_float_status_accepted() {
        assert_eq!(reading(r#"{"status": 7.0}"#).status, 7);
    }

    #[test]
    fn test_float_times_truncate() {
        let r = reading(r#"{"stats": {"moving_time": 60.9}}"#);
        assert_eq!(r.moving_time_s, 60);
    }

    #[test]
    fn test_derived_fields_track_distance() {
        for meters in [0.0, 999.9, 1000.0, 1234.5, 42195.0] {
            let r = reading(&format!(r#"{{"stats": {{"distance": {meters}}}}}"#));
            assert_eq!(r.distance_km(), meters / 1000.0);
            assert_eq!(r.distance_km_whole(), (meters / 1000.0) as i64);
        }
    }
}
