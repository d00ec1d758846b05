use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decorative sparkle string placed either side of the application title.
pub const SPARKLES: &str = "✦ ✧ ✦ ✧";

/// Form header rendering four lines:
///
/// 1. Application title with sparkle decorations.
/// 2. A 60-column `=` separator.
/// 3. Target and interval in `[ url | every Ns ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Beacon URL being polled, or empty before one is entered.
    pub url: &'a str,
    /// Poll interval as typed in the form.
    pub sleep: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(url: &'a str, sleep: &'a str, theme: &'a Theme) -> Self {
        Self { url, sleep, theme }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);
        let url = if self.url.is_empty() {
            "no beacon"
        } else {
            self.url
        };

        vec![
            Line::from(vec![
                Span::styled(SPARKLES, self.theme.header_sparkle),
                Span::styled(" BEACON MONITOR ", self.theme.header),
                Span::styled(SPARKLES, self.theme.header_sparkle),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(url, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(format!("every {}s", self.sleep), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
