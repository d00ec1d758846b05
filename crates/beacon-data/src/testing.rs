//! In-memory [`Transport`] for tests in this and downstream crates.
//!
//! Enabled in downstream crates through the `test-support` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use beacon_core::{BeaconError, Result};

use crate::client::{Headers, Transport, TransportResponse};

/// Replays canned responses in order and records every request.
///
/// Runs out of responses with a transport error, like a dropped connection.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<TransportResponse>>>,
    requests: Arc<Mutex<Vec<(String, Headers)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    pub fn with(responses: Vec<TransportResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    /// Every request seen so far as `(url, headers)`.
    pub fn requests(&self) -> Vec<(String, Headers)> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<TransportResponse> {
        lock(&self.requests).push((url.to_string(), headers.clone()));
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| BeaconError::Http("connection reset".to_string()))
    }
}

/// A response with `status`, an optional `set-cookie` value and `body`.
pub fn response(status: u16, cookie: Option<&str>, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        set_cookie: cookie.map(str::to_string),
        body: body.to_string(),
    }
}
