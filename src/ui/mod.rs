//! Terminal UI surface.
//!
//! [`TerminalSurface`] draws each [`Renderable`] with ratatui:
//!
//! ```text
//! ┌ header: ● title │ source ───────────────────────────┐
//! │ chart: bar chart (distribution) or line chart      │
//! │        (time series, with threshold lines)         │
//! └ status: events | decode failures | uptime | q:quit ┘
//! ```

pub mod common;
pub mod distribution;
pub mod theme;
pub mod timeseries;

use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::error::RenderError;
use crate::render::{Body, RenderSurface, Renderable};
pub use theme::Theme;

/// Minimum terminal size for a usable chart.
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 10;

/// Static presentation settings for a session.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub title: String,
    pub source: String,
    pub theme: Theme,
}

impl ChartView {
    pub fn new(title: impl Into<String>, source: impl Into<String>, theme: Theme) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            theme,
        }
    }
}

/// Lay out and draw one frame.
pub fn render(frame: &mut Frame, view: &ChartView, data: &Renderable) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Min(6),    // Chart
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, view, data, chunks[0]);
    match &data.body {
        Body::NoData => common::render_no_data(frame, view, chunks[1]),
        Body::Distribution(dist) => distribution::render(frame, view, dist, chunks[1]),
        Body::TimeSeries(series) => timeseries::render(frame, view, series, chunks[1]),
    }
    common::render_status_bar(frame, view, data, chunks[2]);
}

/// Draws frames into a ratatui terminal.
pub struct TerminalSurface<B: Backend> {
    terminal: Terminal<B>,
    view: ChartView,
}

impl<B: Backend> TerminalSurface<B> {
    pub fn new(terminal: Terminal<B>, view: ChartView) -> Self {
        Self { terminal, view }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend + Send> RenderSurface for TerminalSurface<B> {
    fn draw(&mut self, data: &Renderable) -> Result<(), RenderError> {
        let view = &self.view;
        self.terminal.draw(|frame| render(frame, view, data))?;
        Ok(())
    }
}

/// Switch the terminal into raw mode on the alternate screen.
///
/// Installs a panic hook that restores the terminal before the default hook
/// prints the panic.
pub fn enter() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo [`enter`].
pub fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::render::{ChartKind, Distribution, Slice};

    fn surface(width: u16, height: u16) -> TerminalSurface<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        TerminalSurface::new(
            terminal,
            ChartView::new("Real-Time Category Frequency", "file: events.jsonl", Theme::dark()),
        )
    }

    fn screen(surface: &TerminalSurface<TestBackend>) -> String {
        let buffer = surface.terminal().backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn frame(body: Body) -> Renderable {
        Renderable {
            chart: ChartKind::Distribution,
            body,
            events_ingested: 6,
            decode_failures: 0,
            elapsed: Duration::from_secs(3),
            stream_ended: None,
        }
    }

    #[test]
    fn test_waiting_for_data() {
        let mut surface = surface(80, 20);
        surface.draw(&frame(Body::NoData)).unwrap();
        let text = screen(&surface);
        assert!(text.contains("Waiting for data..."));
        assert!(text.contains("file: events.jsonl"));
    }

    #[test]
    fn test_distribution_labels() {
        let mut surface = surface(80, 20);
        let dist = Distribution {
            slices: vec![
                Slice {
                    label: "a".to_string(),
                    count: 3,
                    proportion: 0.5,
                },
                Slice {
                    label: "b".to_string(),
                    count: 3,
                    proportion: 0.5,
                },
            ],
            total: 6,
        };
        surface.draw(&frame(Body::Distribution(dist))).unwrap();
        let text = screen(&surface);
        assert!(text.contains("Real-Time Category Frequency"));
        assert!(text.contains("50.0%"));
    }

    #[test]
    fn test_distribution_with_more_categories_than_columns() {
        let mut surface = surface(80, 20);
        let total = 65_537u64;
        let mut slices: Vec<Slice> = (0..65_536u64)
            .map(|i| Slice {
                label: format!("c{i:05}"),
                count: 1,
                proportion: 1.0 / total as f64,
            })
            .collect();
        slices[7].count = 2;
        slices[7].proportion = 2.0 / total as f64;

        surface
            .draw(&frame(Body::Distribution(Distribution { slices, total })))
            .unwrap();
        assert!(screen(&surface).contains("Real-Time Category Frequency"));
    }

    #[test]
    fn test_stream_ended_banner() {
        let mut surface = surface(80, 20);
        surface
            .draw(&frame(Body::NoData).ended("end of stream"))
            .unwrap();
        assert!(screen(&surface).contains("Stream ended: end of stream"));
    }

    #[test]
    fn test_too_small() {
        let mut surface = surface(30, 8);
        surface.draw(&frame(Body::NoData)).unwrap();
        assert!(screen(&surface).contains("Terminal too small"));
    }
}
