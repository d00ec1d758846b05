//! Run configuration loaded from the JSON config file.
//!
//! The file carries the user agent, poll interval, status labels and the
//! output sinks. The Beacon URL is not part of the file; it is injected from
//! the command line when the config is loaded.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{BeaconError, Result};
use crate::formatting::KmSuffix;
use crate::models::StatusCode;

// ── Fetch failure policy ──────────────────────────────────────────────────────

/// What a poll fetch does when the Beacon answers with anything but HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Substitute an empty payload and log at info level.
    #[default]
    Degrade,
    /// Substitute an empty payload and log a warning.
    Warn,
    /// Fail the run with [`BeaconError::FetchFailed`].
    Abort,
}

// ── Status labels ─────────────────────────────────────────────────────────────

/// Mapping from status code (as a string key) to a display label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusLabels(BTreeMap<String, String>);

impl StatusLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self(labels)
    }

    /// Label for a numeric status code.
    ///
    /// A code with no configured label is a fatal configuration error.
    pub fn label(&self, code: i64) -> Result<&str> {
        let key = code.to_string();
        self.0
            .get(&key)
            .map(String::as_str)
            .ok_or(BeaconError::UnknownStatus(key))
    }

    /// Label shown for a payload that could not be decoded.
    ///
    /// Uses the `"Error"` entry when present and the bare word otherwise.
    pub fn label_for_malformed(&self) -> &str {
        self.0
            .get(&StatusCode::Error.label_key())
            .map(String::as_str)
            .unwrap_or("Error")
    }

    /// Label for any [`StatusCode`].
    pub fn label_for(&self, status: StatusCode) -> Result<&str> {
        match status {
            StatusCode::Code(code) => self.label(code),
            StatusCode::Error => Ok(self.label_for_malformed()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Sink specs ────────────────────────────────────────────────────────────────

/// A typed output sink entry from the `outputs` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSpec {
    /// Seven text files named `{prefix}<metric>.txt` in the output directory.
    File { prefix: String },
    /// One comma-joined line per cycle on standard output.
    Stdout { km_suffix: KmSuffix },
}

// ── BeaconConfig ──────────────────────────────────────────────────────────────

/// Immutable configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Beacon URL, injected from the command line.
    #[serde(skip)]
    pub url: String,
    /// User agent sent on every request.
    #[serde(rename = "ua")]
    pub user_agent: String,
    /// Seconds to wait between polls.
    #[serde(rename = "sleep")]
    pub sleep_seconds: u64,
    #[serde(rename = "statuses")]
    pub status_labels: StatusLabels,
    /// Raw sink table, kept in file order.
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub fetch_failure: FetchFailurePolicy,
    /// Optional request timeout in seconds. No timeout when absent.
    #[serde(default, rename = "timeout")]
    pub timeout_seconds: Option<u64>,
}

impl BeaconConfig {
    /// Read the config file at `path` and inject `url`.
    pub fn load(path: &Path, url: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BeaconError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, url)
            .map_err(|e| BeaconError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a config document and inject `url`.
    pub fn from_json(content: &str, url: impl Into<String>) -> Result<Self> {
        let mut config: BeaconConfig = serde_json::from_str(content)?;
        config.url = url.into();
        Ok(config)
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_secs(self.sleep_seconds)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Typed sink specs in file order.
    ///
    /// Unknown sink names are skipped with a warning.
    pub fn sinks(&self) -> Result<Vec<SinkSpec>> {
        let mut sinks = Vec::with_capacity(self.outputs.len());
        for (name, settings) in &self.outputs {
            match name.as_str() {
                "file" => {
                    let prefix = settings
                        .get("fn_prefix")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            BeaconError::Config("outputs.file.fn_prefix is required".to_string())
                        })?;
                    sinks.push(SinkSpec::File {
                        prefix: prefix.to_string(),
                    });
                }
                "stdout" => {
                    let legacy = settings
                        .get("legacy_km_suffix")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let km_suffix = if legacy {
                        KmSuffix::Legacy
                    } else {
                        KmSuffix::Km
                    };
                    sinks.push(SinkSpec::Stdout { km_suffix });
                }
                other => warn!(sink = other, "ignoring unknown output sink"),
            }
        }
        Ok(sinks)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "ua": "Mozilla/5.0 (X11; Linux x86_64)",
        "sleep": 2,
        "statuses": { "0": "Unknown", "1": "Recording", "3": "Paused", "Error": "Offline" },
        "outputs": {
            "stdout": {},
            "file": { "fn_prefix": "p_" }
        }
    }"#;

    fn sample() -> BeaconConfig {
        BeaconConfig::from_json(SAMPLE, "https://beacon.example/abc").expect("parse")
    }

    #[test]
    fn test_from_json_reads_required_keys() {
        let config = sample();
        assert_eq!(config.url, "https://beacon.example/abc");
        assert_eq!(config.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(config.sleep_seconds, 2);
        assert_eq!(config.sleep(), Duration::from_secs(2));
        assert_eq!(config.status_labels.len(), 4);
    }

    #[test]
    fn test_optional_keys_default() {
        let config = sample();
        assert_eq!(config.fetch_failure, FetchFailurePolicy::Degrade);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_optional_keys_parsed() {
        let json = r#"{"ua": "x", "sleep": 1, "statuses": {}, "outputs": {},
                       "fetch_failure": "abort", "timeout": 15}"#;
        let config = BeaconConfig::from_json(json, "u").expect("parse");
        assert_eq!(config.fetch_failure, FetchFailurePolicy::Abort);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_missing_required_key_is_error() {
        let json = r#"{"sleep": 1, "statuses": {}, "outputs": {}}"#;
        let err = BeaconConfig::from_json(json, "u").unwrap_err();
        assert!(err.to_string().contains("ua"), "{err}");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let config = BeaconConfig::load(file.path(), "https://b/1").expect("load");
        assert_eq!(config.url, "https://b/1");
    }

    #[test]
    fn test_load_missing_file_is_file_read() {
        let err = BeaconConfig::load(Path::new("/nonexistent/beacon.json"), "u").unwrap_err();
        assert!(matches!(err, BeaconError::FileRead { .. }));
    }

    #[test]
    fn test_load_invalid_file_names_path() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(b"{ not json").expect("write");
        let err = BeaconConfig::load(file.path(), "u").unwrap_err();
        assert!(matches!(err, BeaconError::Config(_)));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_sinks_keep_file_order() {
        let sinks = sample().sinks().expect("sinks");
        assert_eq!(
            sinks,
            vec![
                SinkSpec::Stdout {
                    km_suffix: KmSuffix::Km
                },
                SinkSpec::File {
                    prefix: "p_".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_sinks_legacy_suffix_and_unknown_skipped() {
        let json = r#"{"ua": "x", "sleep": 1, "statuses": {},
                       "outputs": {"mqtt": {}, "stdout": {"legacy_km_suffix": true}}}"#;
        let sinks = BeaconConfig::from_json(json, "u").unwrap().sinks().unwrap();
        assert_eq!(
            sinks,
            vec![SinkSpec::Stdout {
                km_suffix: KmSuffix::Legacy
            }]
        );
    }

    #[test]
    fn test_file_sink_requires_prefix() {
        let json = r#"{"ua": "x", "sleep": 1, "statuses": {}, "outputs": {"file": {}}}"#;
        let err = BeaconConfig::from_json(json, "u").unwrap().sinks().unwrap_err();
        assert!(err.to_string().contains("fn_prefix"));
    }

    #[test]
    fn test_status_label_lookup() {
        let labels = sample().status_labels;
        assert_eq!(labels.label(1).unwrap(), "Recording");
        assert!(matches!(
            labels.label(9),
            Err(BeaconError::UnknownStatus(code)) if code == "9"
        ));
    }

    #[test]
    fn test_malformed_label_uses_error_entry() {
        let labels = sample().status_labels;
        assert_eq!(labels.label_for_malformed(), "Offline");
        assert_eq!(labels.label_for(StatusCode::Error).unwrap(), "Offline");
    }

    #[test]
    fn test_malformed_label_falls_back_to_literal() {
        let labels = StatusLabels::default();
        assert_eq!(labels.label_for_malformed(), "Error");
        assert!(labels.is_empty());
    }
}
