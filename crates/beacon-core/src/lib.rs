//! Core types shared by every Beacon Monitor crate.
//!
//! Holds the run configuration, CLI settings, the parsed datapoint model,
//! sink text formatting and the common error type.

pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{BeaconError, Result};
