//! Fan-out of each datapoint to the configured output sinks.
//!
//! Every call is independent: the file sink rewrites all of its files in
//! full, and nothing is carried over between cycles.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use beacon_core::config::{BeaconConfig, SinkSpec, StatusLabels};
use beacon_core::formatting::{
    format_integer, format_km, format_meters, format_whole_km, stdout_line, DatapointView,
    KmSuffix,
};
use beacon_core::models::Datapoint;
use beacon_core::{BeaconError, Result};
use tracing::debug;

// ── Output directory ──────────────────────────────────────────────────────────

/// `out/` next to the running executable.
pub fn default_out_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let base = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(base.join("out"))
}

/// Create `dir` and any missing parents.
pub fn ensure_out_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| BeaconError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })
}

// ── Sink ──────────────────────────────────────────────────────────────────────

/// An output destination for the latest datapoint.
pub trait Sink: Send {
    fn name(&self) -> &'static str;

    fn emit(&mut self, view: &DatapointView) -> Result<()>;
}

/// Writes one small text file per metric, overwriting on every call.
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the file holding `metric`, e.g. `out/p_battery.txt`.
    pub fn path_for(&self, metric: &str) -> PathBuf {
        self.dir.join(format!("{}{metric}.txt", self.prefix))
    }

    fn write(&self, metric: &str, contents: &str) -> Result<()> {
        let path = self.path_for(metric);
        std::fs::write(&path, contents).map_err(|source| BeaconError::FileWrite { path, source })
    }
}

impl Sink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn emit(&mut self, view: &DatapointView) -> Result<()> {
        self.write("status", &view.status_label)?;
        self.write("distance", &format_meters(view.distance_m))?;
        self.write("distance_km", &format_km(view.distance_km))?;
        self.write("distance_km_only", &format_whole_km(view.distance_km_whole))?;
        self.write("moving_time", &format_integer(view.moving_time_s))?;
        self.write("elapsed_time", &format_integer(view.elapsed_time_s))?;
        self.write("battery", &format_integer(view.battery_percent))?;
        Ok(())
    }
}

/// Prints one comma-joined summary line per call.
pub struct StdoutSink<W: Write + Send> {
    writer: W,
    km_suffix: KmSuffix,
}

impl<W: Write + Send> StdoutSink<W> {
    pub fn new(writer: W, km_suffix: KmSuffix) -> Self {
        Self { writer, km_suffix }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for StdoutSink<W> {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn emit(&mut self, view: &DatapointView) -> Result<()> {
        writeln!(self.writer, "{}", stdout_line(view, self.km_suffix))?;
        self.writer.flush()?;
        Ok(())
    }
}

// ── OutputDispatcher ──────────────────────────────────────────────────────────

/// Resolves status labels and hands each datapoint to every sink in order.
pub struct OutputDispatcher {
    labels: StatusLabels,
    sinks: Vec<Box<dyn Sink>>,
}

impl OutputDispatcher {
    pub fn new(labels: StatusLabels, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { labels, sinks }
    }

    /// Build the sinks listed in `config.outputs`, in file order.
    ///
    /// File sinks write into `out_dir`, which is created when a file sink is
    /// configured. Stdout sinks write to the process stdout.
    pub fn from_config(config: &BeaconConfig, out_dir: &Path) -> Result<Self> {
        Self::from_config_with(config, out_dir, || Box::new(io::stdout()))
    }

    /// Like [`from_config`](Self::from_config), but each stdout sink writes
    /// to a writer obtained from `stdout`.
    pub fn from_config_with<F>(
        config: &BeaconConfig,
        out_dir: &Path,
        mut stdout: F,
    ) -> Result<Self>
    where
        F: FnMut() -> Box<dyn Write + Send>,
    {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        for spec in config.sinks()? {
            match spec {
                SinkSpec::File { prefix } => {
                    ensure_out_dir(out_dir)?;
                    sinks.push(Box::new(FileSink::new(out_dir, prefix)));
                }
                SinkSpec::Stdout { km_suffix } => {
                    sinks.push(Box::new(StdoutSink::new(stdout(), km_suffix)));
                }
            }
        }
        Ok(Self::new(config.status_labels.clone(), sinks))
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Write `datapoint` to every sink and return the rendered view.
    ///
    /// Stops at the first failing sink. An unlabelled status fails before any
    /// sink runs.
    pub fn dispatch(&mut self, datapoint: &Datapoint) -> Result<DatapointView> {
        let view = DatapointView::resolve(datapoint, &self.labels)?;
        for sink in &mut self.sinks {
            sink.emit(&view)?;
            debug!(sink = sink.name(), status = %view.status, "datapoint written");
        }
        Ok(view)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
