use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Poll a live-tracking Beacon and republish its latest values
#[derive(Parser, Debug, Clone)]
#[command(
    name = "beacon-monitor",
    about = "Poll a live-tracking Beacon and republish its latest values",
    version
)]
pub struct Settings {
    /// Beacon URL
    #[arg(required_unless_present = "interactive")]
    pub url: Option<String>,

    /// Location of the config file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Output directory for the file sink (defaults to `out/` next to the binary)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Run the interactive terminal front end
    #[arg(long)]
    pub interactive: bool,

    /// Seconds between polls (overrides the config file)
    #[arg(long)]
    pub sleep: Option<u64>,

    /// Colour theme for the interactive form
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
