//! Reusable line builders for the Beacon form.

pub mod header;
