//! Application state and terminal event loop for the interactive form.
//!
//! [`App`] owns the form inputs and the currently running [`PollTask`], if
//! any. Key presses edit the inputs or start/stop polling; [`PollEvent`]s
//! from the task update the stats block.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};

use beacon_core::config::BeaconConfig;
use beacon_data::client::{ReqwestTransport, SessionClient, Transport};
use beacon_runtime::dispatcher::OutputDispatcher;
use beacon_runtime::scheduler::{PollEvent, PollTask, PollTaskHandle};

use crate::form_view::{self, Field, FormViewData, Notice, Stats};
use crate::themes::Theme;

/// Initial value of the sleep input.
pub const DEFAULT_SLEEP: &str = "2";

/// Destination of stdout sinks while the form owns the terminal.
#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("captured output lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedOutput {
    /// Drain the buffer and return its last line, if anything was written.
    fn take_last_line(&self) -> Option<String> {
        let mut buf = self.0.lock().ok()?;
        let text = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        text.lines().last().map(str::to_string)
    }
}

struct RunningTask {
    handle: PollTaskHandle,
    rx: mpsc::Receiver<PollEvent>,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root state of the interactive form.
pub struct App {
    pub theme: Theme,
    /// Loaded configuration; the URL and interval come from the form.
    pub config: BeaconConfig,
    /// Directory handed to the file sink.
    pub out_dir: PathBuf,
    pub url_input: String,
    pub sleep_input: String,
    pub focus: Field,
    pub stats: Stats,
    pub notice: Option<Notice>,
    /// Most recent line produced by a configured stdout sink.
    pub last_output: Option<String>,
    /// Waiting for a y/n answer before quitting while polling.
    pub confirm_quit: bool,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    task: Option<RunningTask>,
    output: CapturedOutput,
}

impl App {
    /// Build the form. `config.url` pre-fills the URL input.
    pub fn new(theme_name: &str, config: BeaconConfig, out_dir: PathBuf) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            url_input: config.url.clone(),
            sleep_input: DEFAULT_SLEEP.to_string(),
            config,
            out_dir,
            focus: Field::Url,
            stats: Stats::default(),
            notice: None,
            last_output: None,
            confirm_quit: false,
            should_quit: false,
            task: None,
            output: CapturedOutput::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the form until the user quits.
    ///
    /// Key events are read with a 250 ms `crossterm::event::poll` timeout and
    /// poll events are drained with `try_recv` between frames.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            self.drain_events();

            if self.should_quit {
                break Ok(());
            }
            tokio::task::yield_now().await;
        };

        self.stop();

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let data = FormViewData {
            url: &self.url_input,
            sleep: &self.sleep_input,
            focus: self.focus,
            running: self.is_running(),
            stats: &self.stats,
            notice: self.notice.as_ref(),
            output: self.last_output.as_deref(),
            confirm_quit: self.confirm_quit,
        };
        form_view::render_form(frame, area, &data, &self.theme);
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        if self.confirm_quit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.quit(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_quit = false
                }
                _ => {}
            }
            return;
        }

        let running = self.is_running();
        match key.code {
            KeyCode::Esc => self.request_quit(),
            KeyCode::Char('q') | KeyCode::Char('Q') if running => self.request_quit(),
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.next(),
            KeyCode::Enter => self.toggle(),
            KeyCode::Backspace if !running => {
                self.focused_input().pop();
            }
            KeyCode::Char(c) if !running && !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_input().push(c);
            }
            _ => {}
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::Url => &mut self.url_input,
            Field::Sleep => &mut self.sleep_input,
        }
    }

    fn request_quit(&mut self) {
        if self.is_running() {
            self.confirm_quit = true;
        } else {
            self.should_quit = true;
        }
    }

    fn quit(&mut self) {
        self.stop();
        self.confirm_quit = false;
        self.should_quit = true;
    }

    fn toggle(&mut self) {
        if self.is_running() {
            self.stop();
            self.notice = Some(Notice::Info("Polling stopped".to_string()));
        } else {
            self.start();
        }
    }

    // ── Start / stop ──────────────────────────────────────────────────────────

    /// Start polling over HTTP with the form's URL and interval.
    pub fn start(&mut self) {
        match ReqwestTransport::new(self.config.timeout()) {
            Ok(transport) => self.start_with(transport),
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    /// Start polling through `transport`. Must be called inside a tokio
    /// runtime. Invalid input leaves the form idle with an error notice.
    pub fn start_with<T: Transport + 'static>(&mut self, transport: T) {
        if self.is_running() {
            return;
        }
        let sleep_seconds = match self.sleep_input.trim().parse::<u64>() {
            Ok(secs) => secs,
            Err(_) => {
                self.notice = Some(Notice::Error(
                    "Sleep time must be a whole number of seconds".to_string(),
                ));
                return;
            }
        };
        let url = self.url_input.trim();
        if url.is_empty() {
            self.notice = Some(Notice::Error("Enter a Beacon URL".to_string()));
            return;
        }

        let mut config = self.config.clone();
        config.url = url.to_string();
        config.sleep_seconds = sleep_seconds;

        // Stdout sinks must not write over the alternate screen.
        let output = self.output.clone();
        let dispatcher = match OutputDispatcher::from_config_with(&config, &self.out_dir, move || {
            Box::new(output.clone())
        }) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                warn!(error = %e, "cannot build output sinks");
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };
        let client = SessionClient::from_config(transport, &config);
        let (rx, handle) = PollTask::new(client, dispatcher, config.sleep()).spawn();

        info!(url = %config.url, sleep_seconds, "interactive polling requested");
        self.task = Some(RunningTask { handle, rx });
        self.notice = Some(Notice::Info("Connecting to Beacon...".to_string()));
    }

    /// Cancel the running task, if any, and unlock the inputs.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.cancel();
        }
    }

    // ── Poll events ───────────────────────────────────────────────────────────

    /// Apply every event the running task has sent so far.
    pub fn drain_events(&mut self) {
        let mut events = Vec::new();
        let mut disconnected = false;
        if let Some(task) = self.task.as_mut() {
            loop {
                match task.rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        for event in events {
            self.handle_event(event);
        }
        if let Some(line) = self.output.take_last_line() {
            self.last_output = Some(line);
        }
        if disconnected && self.task.is_some() {
            self.task = None;
        }
    }

    pub fn handle_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Started => {
                self.notice = Some(Notice::Info(format!(
                    "Beacon is live; polling every {}s",
                    self.sleep_input.trim()
                )));
            }
            PollEvent::Datapoint(view) => self.stats = Stats::from_view(&view),
            PollEvent::Stopped(status) => {
                self.stop();
                self.notice = Some(Notice::Info(format!(
                    "Beacon no longer active (status {status})"
                )));
            }
            PollEvent::Aborted => {
                self.stop();
                self.notice = Some(Notice::Error(
                    "Beacon is not live; polling not started".to_string(),
                ));
            }
            PollEvent::Failed(message) => {
                self.stop();
                self.notice = Some(Notice::Error(message));
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_data::testing::{response, ScriptedTransport};
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "ua": "beacon-ui-test/1.0",
        "sleep": 2,
        "statuses": {"0": "Not started", "1": "Recording", "2": "Finished", "7": "Auto-paused"},
        "outputs": {}
    }"#;

    fn scripted(responses: &[(u16, &str)]) -> ScriptedTransport {
        ScriptedTransport::with(
            responses
                .iter()
                .map(|(status, body)| response(*status, None, body))
                .collect(),
        )
    }

    fn app(dir: &TempDir) -> App {
        let config = BeaconConfig::from_json(CONFIG, "https://beacon.example/live/1").unwrap();
        App::new("dark", config, dir.path().to_path_buf())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.drain_events();
            if !app.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("poll task did not finish");
    }

    // ── Construction ─────────────────────────────────────────────────────────

    #[test]
    fn test_new_prefills_url_and_sleep() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        assert_eq!(app.url_input, "https://beacon.example/live/1");
        assert_eq!(app.sleep_input, DEFAULT_SLEEP);
        assert_eq!(app.focus, Field::Url);
        assert_eq!(app.stats, Stats::default());
        assert!(!app.is_running());
    }

    // ── Keys ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_typing_edits_focused_field() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Field::Sleep);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.sleep_input, "10");

        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.url_input.ends_with("/1q"), "q is text while idle");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let mut key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        app.handle_key(key);
        assert_eq!(app.url_input, "https://beacon.example/live/1");
    }

    #[test]
    fn test_esc_quits_when_idle() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
        assert!(!app.confirm_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.url_input.ends_with("/1"), "ctrl+c is not typed");
    }

    // ── Start validation ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_start_rejects_non_numeric_sleep() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.sleep_input = "two".to_string();
        app.start_with(ScriptedTransport::default());
        assert!(!app.is_running());
        assert!(matches!(app.notice, Some(Notice::Error(_))));
    }

    #[tokio::test]
    async fn test_start_rejects_empty_url() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.url_input = "   ".to_string();
        app.start_with(ScriptedTransport::default());
        assert!(!app.is_running());
        assert_eq!(
            app.notice,
            Some(Notice::Error("Enter a Beacon URL".to_string()))
        );
    }

    // ── Poll task integration ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_failed_handshake_returns_to_idle() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.start_with(scripted(&[(404, "")]));
        assert!(app.is_running());

        settle(&mut app).await;

        assert_eq!(
            app.notice,
            Some(Notice::Error(
                "Beacon is not live; polling not started".to_string()
            ))
        );
        assert_eq!(app.stats, Stats::default());
    }

    #[tokio::test]
    async fn test_polls_until_beacon_stops() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.sleep_input = "0".to_string();
        app.start_with(scripted(&[
            (200, "<html/>"),
            (
                200,
                r#"{"status": 1, "battery_level": 80, "stats": {"distance": 1500.0}}"#,
            ),
            (
                200,
                r#"{"status": 2, "battery_level": 75, "stats": {"distance": 2500.0, "moving_time": 600, "elapsed_time": 700}}"#,
            ),
        ]));

        settle(&mut app).await;

        assert_eq!(app.stats.status, "Finished");
        assert_eq!(app.stats.distance, "2500.00m");
        assert_eq!(app.stats.moving_time, "600s");
        assert_eq!(app.stats.elapsed_time, "700s");
        assert_eq!(app.stats.battery, "75%");
        assert!(matches!(app.notice, Some(Notice::Info(_))));
    }

    #[tokio::test]
    async fn test_running_locks_inputs_and_asks_before_quit() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.sleep_input = "3600".to_string();
        app.start_with(scripted(&[(200, "")]));

        press(&mut app, KeyCode::Char('x'));
        assert!(app.url_input.ends_with("/1"), "inputs locked while running");

        press(&mut app, KeyCode::Char('q'));
        assert!(app.confirm_quit);
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('n'));
        assert!(!app.confirm_quit);
        assert!(app.is_running());

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit);
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn test_enter_toggles_stop() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.sleep_input = "3600".to_string();
        app.start_with(scripted(&[(200, "")]));
        assert!(app.is_running());

        press(&mut app, KeyCode::Enter);

        assert!(!app.is_running());
        assert_eq!(app.notice, Some(Notice::Info("Polling stopped".to_string())));
    }

    #[tokio::test]
    async fn test_stdout_sink_is_captured_into_form() {
        let dir = TempDir::new().unwrap();
        let config = BeaconConfig::from_json(
            &CONFIG.replace(r#""outputs": {}"#, r#""outputs": {"stdout": {}}"#),
            "https://beacon.example/live/1",
        )
        .unwrap();
        let mut app = App::new("dark", config, dir.path().to_path_buf());
        app.sleep_input = "0".to_string();
        app.start_with(scripted(&[
            (200, "<html/>"),
            (200, r#"{"status": 2, "battery_level": 40, "stats": {"distance": 900.0}}"#),
        ]));

        settle(&mut app).await;

        let line = app.last_output.as_deref().expect("captured line");
        assert!(line.starts_with("Status: Finished, Distance: 900.00m"), "{line}");
        assert!(line.ends_with("Battery: 40%"), "{line}");
    }

    #[test]
    fn test_captured_output_keeps_last_line() {
        let mut output = CapturedOutput::default();
        assert_eq!(output.take_last_line(), None);

        writeln!(output, "first").unwrap();
        writeln!(output, "second").unwrap();
        assert_eq!(output.take_last_line().as_deref(), Some("second"));
        assert_eq!(output.take_last_line(), None, "buffer is drained");
    }

    #[test]
    fn test_failed_event_shows_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_event(PollEvent::Failed("No label configured for status 4".to_string()));
        assert_eq!(
            app.notice,
            Some(Notice::Error("No label configured for status 4".to_string()))
        );
    }
}
