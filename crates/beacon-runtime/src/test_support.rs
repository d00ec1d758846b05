//! Fixtures shared by the runtime tests.

use beacon_core::config::{FetchFailurePolicy, StatusLabels};
use beacon_data::client::{SessionClient, TransportResponse};

pub use beacon_data::testing::ScriptedTransport;

pub fn handshake(status: u16) -> TransportResponse {
    TransportResponse {
        status,
        set_cookie: Some("sid=1; Path=/".to_string()),
        body: String::new(),
    }
}

pub fn payload(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        set_cookie: Some("sid=1".to_string()),
        body: body.to_string(),
    }
}

pub fn status_payload(status: i64) -> TransportResponse {
    payload(&format!(
        r#"{{"status": {status}, "battery_level": 90, "stats": {{"distance": 2500.0}}}}"#
    ))
}

pub fn session(transport: ScriptedTransport) -> SessionClient<ScriptedTransport> {
    SessionClient::new(
        transport,
        "https://beacon.example/live/1",
        "beacon-test",
        FetchFailurePolicy::Degrade,
    )
}

/// Labels for every code the tests emit except 4.
pub fn labels() -> StatusLabels {
    let map = [
        ("0", "Not started"),
        ("1", "Recording"),
        ("2", "Finished"),
        ("3", "Paused"),
        ("5", "Discarded"),
        ("7", "Auto-paused"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    StatusLabels::new(map)
}
