//! Runtime layer for Beacon Monitor.
//!
//! Wires the session client, parser and output sinks together: the blocking
//! poll loop used on the command line, and a cancellable scheduled task used
//! by the interactive front end.

pub mod controller;
pub mod dispatcher;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use beacon_core as core;
pub use beacon_data as data;
