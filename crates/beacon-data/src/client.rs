//! HTTP session with the Beacon.
//!
//! [`SessionClient`] owns the request headers for the whole run. It performs
//! the initial handshake, polls for datapoints, and keeps the session cookie
//! in sync with what the server last said. The wire is reached through the
//! narrow [`Transport`] trait; [`ReqwestTransport`] is the production
//! implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::config::{BeaconConfig, FetchFailurePolicy};
use beacon_core::{BeaconError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use tracing::{debug, info, warn};

/// Header name → value, lower-case names.
pub type Headers = BTreeMap<String, String>;

pub const USER_AGENT: &str = "user-agent";
pub const COOKIE: &str = "cookie";
pub const REFERER: &str = "referer";
pub const REQUESTED_WITH: &str = "x-requested-with";

/// Payload substituted when a poll fetch does not return HTTP 200.
pub const EMPTY_PAYLOAD: &str = "{}";

// ── Transport ─────────────────────────────────────────────────────────────────

/// The parts of an HTTP response the session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Raw `set-cookie` header value, if the server sent one.
    pub set_cookie: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Outbound HTTP GET.
///
/// Transport failures (DNS, refused connection, timeout) are returned as
/// [`BeaconError::Http`]; any HTTP status is a successful call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
///
/// The client keeps no cookie jar of its own; cookies travel only through
/// the headers handed to [`Transport::get`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` of `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BeaconError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<TransportResponse> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BeaconError::Http(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| BeaconError::Http(format!("invalid value for {name}: {e}")))?;
            header_map.insert(name, value);
        }

        let response = self
            .client
            .get(url)
            .headers(header_map)
            .send()
            .await
            .map_err(|e| BeaconError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| BeaconError::Http(e.to_string()))?;

        Ok(TransportResponse {
            status,
            set_cookie,
            body,
        })
    }
}

// ── SessionClient ─────────────────────────────────────────────────────────────

/// Single-owner HTTP session against one Beacon URL.
pub struct SessionClient<T: Transport> {
    transport: T,
    url: String,
    headers: Headers,
    fetch_failure: FetchFailurePolicy,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(
        transport: T,
        url: impl Into<String>,
        user_agent: impl Into<String>,
        fetch_failure: FetchFailurePolicy,
    ) -> Self {
        let mut headers = Headers::new();
        headers.insert(USER_AGENT.to_string(), user_agent.into());
        Self {
            transport,
            url: url.into(),
            headers,
            fetch_failure,
        }
    }

    pub fn from_config(transport: T, config: &BeaconConfig) -> Self {
        Self::new(
            transport,
            config.url.clone(),
            config.user_agent.clone(),
            config.fetch_failure,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current session headers (user agent plus cookie when one is held).
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn cookie(&self) -> Option<&str> {
        self.headers.get(COOKIE).map(String::as_str)
    }

    /// Handshake with the Beacon page to obtain the session cookie.
    ///
    /// Returns `true` when the server answered HTTP 200.
    pub async fn initialize(&mut self) -> Result<bool> {
        debug!(url = %self.url, "initial Beacon request");
        let response = self.transport.get(&self.url, &self.headers).await?;
        self.sync_cookie(&response);
        debug!(status = response.status, "initial Beacon response");
        Ok(response.is_ok())
    }

    /// Fetch the newest datapoint payload.
    ///
    /// Returns the body on HTTP 200. Any other status yields
    /// [`EMPTY_PAYLOAD`], unless the fetch failure policy is `abort`.
    pub async fn fetch_datapoint(&mut self) -> Result<String> {
        let mut headers = self.headers.clone();
        headers.insert(REFERER.to_string(), self.url.clone());
        headers.insert(REQUESTED_WITH.to_string(), "XMLHttpRequest".to_string());

        let url = poll_url(&self.url, chrono::Utc::now().timestamp());
        debug!(%url, "polling Beacon");
        let response = self.transport.get(&url, &headers).await?;
        self.sync_cookie(&response);

        if response.is_ok() {
            return Ok(response.body);
        }

        match self.fetch_failure {
            FetchFailurePolicy::Degrade => {
                info!(status = response.status, "poll failed; using empty payload");
            }
            FetchFailurePolicy::Warn => {
                warn!(status = response.status, "poll failed; using empty payload");
            }
            FetchFailurePolicy::Abort => {
                return Err(BeaconError::FetchFailed {
                    status: response.status,
                });
            }
        }
        Ok(EMPTY_PAYLOAD.to_string())
    }

    /// Bring the stored cookie in line with `response`.
    ///
    /// On HTTP 200 the cookie is replaced by the `set-cookie` value (up to
    /// the first `;`) or removed when the header is absent. Other statuses
    /// leave the headers untouched.
    fn sync_cookie(&mut self, response: &TransportResponse) {
        if !response.is_ok() {
            return;
        }
        match response.set_cookie.as_deref() {
            Some(raw) => {
                let cookie = raw.split(';').next().unwrap_or_default().to_string();
                debug!("session cookie updated");
                self.headers.insert(COOKIE.to_string(), cookie);
            }
            None => {
                if self.headers.remove(COOKIE).is_some() {
                    debug!("session cookie cleared");
                }
            }
        }
    }
}

/// Base URL plus the `minimum_timestamp` query parameter.
pub fn poll_url(base: &str, timestamp: i64) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}minimum_timestamp={timestamp}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
