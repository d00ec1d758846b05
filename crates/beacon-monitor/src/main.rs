mod bootstrap;

use anyhow::Result;
use beacon_core::settings::Settings;
use beacon_data::client::{ReqwestTransport, SessionClient};
use beacon_runtime::controller::{PollController, RunOutcome};
use beacon_runtime::dispatcher::OutputDispatcher;
use beacon_ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(
        &settings.log_level,
        settings.log_file.as_deref(),
        settings.interactive,
    )?;

    tracing::info!("Beacon Monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let config = bootstrap::load_config(&settings)?;
    let out_dir = bootstrap::prepare_out_dir(&settings)?;
    tracing::info!(
        "Config: {}, Output dir: {}, Sleep: {}s",
        settings.config.display(),
        out_dir.display(),
        config.sleep_seconds
    );

    if settings.interactive {
        let app = App::new(&settings.theme, config, out_dir);

        // The form handles Ctrl+C as a key while in raw mode; the signal
        // covers the window before raw mode is entered.
        tokio::select! {
            result = app.run() => result?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down");
            }
        }
        return Ok(());
    }

    let dispatcher = OutputDispatcher::from_config(&config, &out_dir)?;
    tracing::info!("Sinks: {:?}", dispatcher.sink_names());
    let transport = ReqwestTransport::new(config.timeout())?;
    let client = SessionClient::from_config(transport, &config);
    let mut controller = PollController::new(client, dispatcher, config.sleep());

    tokio::select! {
        outcome = controller.run() => match outcome? {
            RunOutcome::Aborted => {
                tracing::warn!("Beacon {} is not live", config.url);
            }
            RunOutcome::Stopped { last_status, cycles } => {
                tracing::info!("Beacon finished with status {} after {} polls", last_status, cycles);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; stopping poll loop");
        }
    }

    Ok(())
}
