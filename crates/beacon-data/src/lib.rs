//! Data layer for Beacon Monitor.
//!
//! Owns the HTTP session with the Beacon (handshake, cookie continuity,
//! datapoint polling) and turns raw payloads into [`Datapoint`]s.
//!
//! [`Datapoint`]: beacon_core::models::Datapoint

pub mod client;
pub mod parser;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use beacon_core as core;
