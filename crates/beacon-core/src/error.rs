use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by Beacon Monitor.
#[derive(Error, Debug)]
pub enum BeaconError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sink output file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The Beacon reported a status code with no configured label.
    #[error("No label configured for status {0}")]
    UnknownStatus(String),

    /// The HTTP transport failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A poll request returned a non-200 status under the `abort` policy.
    #[error("Beacon fetch returned HTTP {status}")]
    FetchFailed { status: u16 },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the beacon crates.
pub type Result<T> = std::result::Result<T, BeaconError>;
