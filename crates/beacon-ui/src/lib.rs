//! Terminal front end for Beacon Monitor.
//!
//! A form with URL and interval inputs, Start/Stop and Quit, a polling
//! indicator and the latest Beacon values, rendered with [`ratatui`].

pub mod app;
pub mod components;
pub mod form_view;
pub mod themes;

pub use beacon_core as core;
