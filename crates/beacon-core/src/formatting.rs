//! Text rendering of datapoints for the output sinks and the terminal view.

use crate::config::StatusLabels;
use crate::error::Result;
use crate::models::{Datapoint, StatusCode};

/// Unit suffix on the `Distance KM` field of the stdout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KmSuffix {
    /// `"Distance KM: 1.23km"`.
    #[default]
    Km,
    /// `"Distance KM: 1.23m"`, byte-compatible with older overlay scrapers.
    Legacy,
}

impl KmSuffix {
    pub fn as_str(self) -> &'static str {
        match self {
            KmSuffix::Km => "km",
            KmSuffix::Legacy => "m",
        }
    }
}

// ── DatapointView ─────────────────────────────────────────────────────────────

/// A datapoint with its status label resolved, ready to render.
///
/// A malformed payload renders with zero for every metric.
#[derive(Debug, Clone, PartialEq)]
pub struct DatapointView {
    pub status: StatusCode,
    pub status_label: String,
    pub distance_m: f64,
    pub distance_km: f64,
    pub distance_km_whole: i64,
    pub moving_time_s: i64,
    pub elapsed_time_s: i64,
    pub battery_percent: i64,
}

impl DatapointView {
    /// Resolve the label for `datapoint`.
    ///
    /// Fails with [`crate::BeaconError::UnknownStatus`] when a numeric status
    /// has no configured label.
    pub fn resolve(datapoint: &Datapoint, labels: &StatusLabels) -> Result<Self> {
        let status = datapoint.status();
        let status_label = labels.label_for(status)?.to_string();
        let view = match datapoint {
            Datapoint::Reading(r) => Self {
                status,
                status_label,
                distance_m: r.distance_m,
                distance_km: r.distance_km(),
                distance_km_whole: r.distance_km_whole(),
                moving_time_s: r.moving_time_s,
                elapsed_time_s: r.elapsed_time_s,
                battery_percent: r.battery_percent,
            },
            Datapoint::Malformed => Self {
                status,
                status_label,
                distance_m: 0.0,
                distance_km: 0.0,
                distance_km_whole: 0,
                moving_time_s: 0,
                elapsed_time_s: 0,
                battery_percent: 0,
            },
        };
        Ok(view)
    }
}

// ── Field formatters ──────────────────────────────────────────────────────────

/// Two-decimal metres, e.g. `1234.50`.
pub fn format_meters(meters: f64) -> String {
    format!("{meters:.2}")
}

/// Two-decimal kilometres, e.g. `1.23`.
pub fn format_km(km: f64) -> String {
    format!("{km:.2}")
}

/// Whole kilometres rendered with two decimals, e.g. `1.00`.
pub fn format_whole_km(km: i64) -> String {
    format!("{:.2}", km as f64)
}

/// Plain integer, no unit.
pub fn format_integer(value: i64) -> String {
    value.to_string()
}

/// Seconds with unit, e.g. `60s`.
pub fn format_seconds(seconds: i64) -> String {
    format!("{seconds}s")
}

/// Percentage with unit, e.g. `55%`.
pub fn format_percent(percent: i64) -> String {
    format!("{percent}%")
}

/// The single stdout sink line.
///
/// ```
/// use beacon_core::formatting::{stdout_line, DatapointView, KmSuffix};
/// use beacon_core::models::StatusCode;
///
/// let view = DatapointView {
///     status: StatusCode::Code(1),
///     status_label: "Recording".to_string(),
///     distance_m: 1234.5,
///     distance_km: 1.2345,
///     distance_km_whole: 1,
///     moving_time_s: 60,
///     elapsed_time_s: 90,
///     battery_percent: 55,
/// };
/// assert_eq!(
///     stdout_line(&view, KmSuffix::Km),
///     "Status: Recording, Distance: 1234.50m, Distance KM: 1.23km, \
///      Moving time: 60s, Elapsed time: 90s, Battery: 55%"
/// );
/// ```
pub fn stdout_line(view: &DatapointView, km_suffix: KmSuffix) -> String {
    [
        format!("Status: {}", view.status_label),
        format!("Distance: {}m", format_meters(view.distance_m)),
        format!(
            "Distance KM: {}{}",
            format_km(view.distance_km),
            km_suffix.as_str()
        ),
        format!("Moving time: {}", format_seconds(view.moving_time_s)),
        format!("Elapsed time: {}", format_seconds(view.elapsed_time_s)),
        format!("Battery: {}", format_percent(view.battery_percent)),
    ]
    .join(", ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
