//! Interactive form: URL and interval inputs, Start/Stop, and the latest
//! values reported by the Beacon.

use beacon_core::formatting::{format_meters, format_percent, format_seconds, DatapointView};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::components::header::Header;
use crate::themes::Theme;

/// Column at which input values and stat values start.
const LABEL_WIDTH: usize = 16;

// ── View data ─────────────────────────────────────────────────────────────────

/// Input field that currently receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Url,
    Sleep,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Url => Field::Sleep,
            Field::Sleep => Field::Url,
        }
    }
}

/// Display strings for the stats block.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub status: String,
    pub distance: String,
    pub moving_time: String,
    pub elapsed_time: String,
    pub battery: String,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            status: "Unknown".to_string(),
            distance: "0.00m".to_string(),
            moving_time: "0s".to_string(),
            elapsed_time: "0s".to_string(),
            battery: "0%".to_string(),
        }
    }
}

impl Stats {
    pub fn from_view(view: &DatapointView) -> Self {
        Self {
            status: view.status_label.clone(),
            distance: format!("{}m", format_meters(view.distance_m)),
            moving_time: format_seconds(view.moving_time_s),
            elapsed_time: format_seconds(view.elapsed_time_s),
            battery: format_percent(view.battery_percent),
        }
    }
}

/// One-line feedback shown under the buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Everything the form needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FormViewData<'a> {
    pub url: &'a str,
    pub sleep: &'a str,
    pub focus: Field,
    pub running: bool,
    pub stats: &'a Stats,
    pub notice: Option<&'a Notice>,
    /// Last stdout sink line, shown in place of printing it.
    pub output: Option<&'a str>,
    pub confirm_quit: bool,
}

// ── Line builders ─────────────────────────────────────────────────────────────

fn pad_label(label: &str) -> String {
    let width = UnicodeWidthStr::width(label);
    let padding = LABEL_WIDTH.saturating_sub(width).max(1);
    format!("{label}{}", " ".repeat(padding))
}

fn input_row<'a>(
    label: &str,
    value: &str,
    focused: bool,
    locked: bool,
    theme: &'a Theme,
) -> Line<'a> {
    let marker = if focused && !locked { "> " } else { "  " };
    let cursor = if focused && !locked { "_" } else { "" };
    Line::from(vec![
        Span::styled(marker, theme.info),
        Span::styled(pad_label(label), theme.label),
        Span::styled(format!("{value}{cursor}"), theme.input_style(focused, locked)),
    ])
}

fn stat_row<'a>(label: &str, value: &str, theme: &'a Theme) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(pad_label(label), theme.label),
        Span::styled(value.to_string(), theme.value),
    ])
}

/// Build every line of the form.
pub fn build_form_lines<'a>(data: &FormViewData<'_>, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut lines = Header::new(data.url, data.sleep, theme)
        .to_lines()
        .into_iter()
        .map(|line| {
            Line::from(
                line.spans
                    .into_iter()
                    .map(|s| Span::styled(s.content.into_owned(), s.style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<Line<'a>>>();

    lines.push(input_row(
        "Beacon URL:",
        data.url,
        data.focus == Field::Url,
        data.running,
        theme,
    ));
    lines.push(input_row(
        "Sleep time:",
        data.sleep,
        data.focus == Field::Sleep,
        data.running,
        theme,
    ));
    lines.push(Line::from(""));

    let toggle = if data.running { "[ Stop ]" } else { "[ Start ]" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(toggle, theme.button),
        Span::raw("  "),
        Span::styled("[ Quit ]", theme.button),
    ]));

    let status_text = if data.running {
        "Polling is enabled..."
    } else {
        "Polling is disabled..."
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(status_text, theme.running_style(data.running)),
    ]));
    lines.push(Line::from(""));

    lines.push(stat_row("Status:", &data.stats.status, theme));
    lines.push(stat_row("Distance:", &data.stats.distance, theme));
    lines.push(stat_row("Moving time:", &data.stats.moving_time, theme));
    lines.push(stat_row("Elapsed time:", &data.stats.elapsed_time, theme));
    lines.push(stat_row("Battery:", &data.stats.battery, theme));
    if let Some(output) = data.output {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(output.to_string(), theme.dim),
        ]));
    }
    lines.push(Line::from(""));

    if data.confirm_quit {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                "Beacon is running. Are you sure you want to close? (y/n)",
                theme.warning,
            ),
        ]));
    } else if let Some(notice) = data.notice {
        let (text, style) = match notice {
            Notice::Info(text) => (text.clone(), theme.info),
            Notice::Error(text) => (text.clone(), theme.error),
        };
        lines.push(Line::from(vec![Span::raw("  "), Span::styled(text, style)]));
    }

    lines.push(Line::from(Span::styled(
        "  Tab: switch field   Enter: start/stop   Esc/q: quit",
        theme.dim,
    )));
    lines
}

/// Render the form into `area`.
pub fn render_form(frame: &mut Frame, area: Rect, data: &FormViewData<'_>, theme: &Theme) {
    let lines = build_form_lines(data, theme);
    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Beacon Monitor "),
    );
    frame.render_widget(paragraph, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
