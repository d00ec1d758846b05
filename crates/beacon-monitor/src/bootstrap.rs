use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use beacon_core::config::BeaconConfig;
use beacon_core::settings::Settings;
use beacon_runtime::dispatcher::{default_out_dir, ensure_out_dir};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name to a `tracing` filter directive.
///
/// Unrecognised names are passed through unchanged so that `EnvFilter`
/// directives such as `beacon_data=debug` still work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to `log_file` when given. Otherwise they go to stderr, except in
/// interactive mode where they are discarded so the form is not overdrawn.
/// Stdout is left to the stdout sink.
pub fn setup_logging(
    log_level: &str,
    log_file: Option<&Path>,
    interactive: bool,
) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_target(false).with_thread_ids(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None if interactive => {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(io::sink))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(io::stderr))
                .init();
        }
    }

    Ok(())
}

// ── Config and output directory ────────────────────────────────────────────────

/// Load the config file named on the command line and apply CLI overrides.
///
/// In interactive mode without a URL the config starts with an empty URL.
pub fn load_config(settings: &Settings) -> anyhow::Result<BeaconConfig> {
    let url = settings.url.clone().unwrap_or_default();
    let mut config = BeaconConfig::load(&settings.config, url)
        .with_context(|| format!("cannot load config {}", settings.config.display()))?;
    if let Some(sleep) = settings.sleep {
        config.sleep_seconds = sleep;
    }
    Ok(config)
}

/// `--out-dir` if given, else `out/` next to the executable. Created if absent.
pub fn prepare_out_dir(settings: &Settings) -> anyhow::Result<PathBuf> {
    let dir = match &settings.out_dir {
        Some(dir) => dir.clone(),
        None => default_out_dir().context("cannot locate the executable")?,
    };
    ensure_out_dir(&dir)?;
    Ok(dir)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
