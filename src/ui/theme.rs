//! Theme configuration for the terminal UI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Slice colors, cycled by category position.
const PALETTE: [Color; 5] = [
    Color::Rgb(0xFF, 0x57, 0x33),
    Color::Rgb(0x33, 0xFF, 0x57),
    Color::Rgb(0x33, 0x57, 0xFF),
    Color::Rgb(0xF3, 0xFF, 0x33),
    Color::Rgb(0xFF, 0x33, 0xA8),
];

/// Color and style theme for the terminal UI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for titles and active elements.
    pub highlight: Color,
    /// Metric line color.
    pub series: Color,
    /// Color of the active alert marker and the upper threshold line.
    pub alert: Color,
    /// Color of the inactive alert marker and the lower threshold line.
    pub ok: Color,
    /// Color for the stream-ended banner.
    pub warning: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for chart titles.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            series: Color::Cyan,
            alert: Color::Red,
            ok: Color::Green,
            warning: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            series: Color::Blue,
            alert: Color::Red,
            ok: Color::Green,
            warning: Color::Magenta,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Color for the slice at `index`.
    pub fn slice_color(&self, index: usize) -> Color {
        PALETTE[index % PALETTE.len()]
    }

    /// Style for the alert indicator.
    pub fn alert_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.alert).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.ok)
        }
    }
}
