//! Datapoint model produced by one Beacon poll.

use std::fmt;

// ── Status codes ──────────────────────────────────────────────────────────────

/// Status codes for which polling keeps going (recording, paused,
/// recording auto-paused).
pub const CONTINUE_STATUSES: [i64; 3] = [1, 3, 7];

/// Status assumed before the first fetch so the loop body runs at least once.
pub const INITIAL_STATUS: i64 = 7;

/// Status reported by a datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Numeric status reported by the Beacon (0 when absent).
    Code(i64),
    /// The payload could not be decoded at all.
    Error,
}

impl StatusCode {
    /// `true` when the poll loop should schedule another cycle.
    pub fn should_continue(self) -> bool {
        match self {
            StatusCode::Code(code) => CONTINUE_STATUSES.contains(&code),
            StatusCode::Error => false,
        }
    }

    /// Key used to look up the label in the `statuses` config map.
    pub fn label_key(self) -> String {
        self.to_string()
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::Code(INITIAL_STATUS)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Code(code) => write!(f, "{code}"),
            StatusCode::Error => f.write_str("Error"),
        }
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Metrics decoded from a well-formed payload.
///
/// Kilometre values are derived from `distance_m` on demand so they can never
/// drift from the metre value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub status: i64,
    pub distance_m: f64,
    pub moving_time_s: i64,
    pub elapsed_time_s: i64,
    pub battery_percent: i64,
}

impl Reading {
    /// Distance in kilometres.
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Whole kilometres covered, truncated toward zero.
    pub fn distance_km_whole(&self) -> i64 {
        self.distance_km().trunc() as i64
    }
}

// ── Datapoint ─────────────────────────────────────────────────────────────────

/// One parsed Beacon snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datapoint {
    /// The payload decoded; missing fields hold their defaults.
    Reading(Reading),
    /// The payload was not valid JSON.
    Malformed,
}

impl Datapoint {
    pub fn status(&self) -> StatusCode {
        match self {
            Datapoint::Reading(reading) => StatusCode::Code(reading.status),
            Datapoint::Malformed => StatusCode::Error,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
