use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are considered dark; 7–15 are considered light. If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Styles used by the Beacon form.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_sparkle: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Inputs ───────────────────────────────────────────────────────────────
    /// Input field that has keyboard focus.
    pub input_focused: Style,
    /// Editable input without focus.
    pub input: Style,
    /// Input locked while polling.
    pub input_disabled: Style,
    pub button: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_sparkle: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            dim: Style::default().fg(Color::DarkGray),
            label: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            input_focused: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::UNDERLINED),
            input: Style::default().fg(Color::Gray),
            input_disabled: Style::default().fg(Color::DarkGray),
            button: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_sparkle: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            dim: Style::default().fg(Color::Gray),
            label: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            value: Style::default().fg(Color::Black),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            input_focused: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::UNDERLINED),
            input: Style::default().fg(Color::DarkGray),
            input_disabled: Style::default().fg(Color::Gray),
            button: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Classic theme using only the basic 8-colour ANSI palette, no modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_sparkle: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            input_focused: Style::default().fg(Color::White),
            input: Style::default().fg(Color::Gray),
            input_disabled: Style::default().fg(Color::DarkGray),
            button: Style::default().fg(Color::Cyan),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Style for the polling indicator line.
    pub fn running_style(&self, running: bool) -> Style {
        if running {
            self.success
        } else {
            self.error
        }
    }

    /// Style for an input field given its focus and lock state.
    pub fn input_style(&self, focused: bool, locked: bool) -> Style {
        if locked {
            self.input_disabled
        } else if focused {
            self.input_focused
        } else {
            self.input
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
