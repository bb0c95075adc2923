//! Header, status bar and placeholder shared by both charts.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::ChartView;
use crate::duration::format_duration;
use crate::render::{Body, Renderable};

/// Render the header bar: liveness dot, title, source.
pub fn render_header(frame: &mut Frame, view: &ChartView, data: &Renderable, area: Rect) {
    let dot_style = if data.stream_ended.is_some() {
        Style::default().fg(view.theme.warning)
    } else {
        match &data.body {
            Body::TimeSeries(series) => view.theme.alert_style(series.alert.active),
            _ => Style::default().fg(view.theme.ok),
        }
    };

    let line = Line::from(vec![
        Span::styled(" ● ", dot_style),
        Span::styled(
            view.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::raw(view.source.clone()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Text of the status bar.
pub fn status_text(data: &Renderable) -> String {
    let counters = format!(
        "{} events | {} decode failures | up {}",
        format_count(data.events_ingested),
        format_count(data.decode_failures),
        format_duration(data.elapsed),
    );

    match &data.stream_ended {
        Some(reason) => format!(" Stream ended: {} | {} | q:quit", reason, counters),
        None => format!(" {} | q:quit", counters),
    }
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, view: &ChartView, data: &Renderable, area: Rect) {
    let style = if data.stream_ended.is_some() {
        Style::default()
            .fg(view.theme.warning)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    frame.render_widget(Paragraph::new(status_text(data)).style(style), area);
}

/// Render the placeholder shown before the first event.
pub fn render_no_data(frame: &mut Frame, view: &ChartView, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", view.title))
        .title_style(view.theme.header)
        .borders(Borders::ALL)
        .border_type(view.theme.border_type)
        .border_style(Style::default().fg(view.theme.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let y = inner.y + inner.height / 2;
    let centered = Rect::new(inner.x, y, inner.width, 1.min(inner.height));
    let paragraph = Paragraph::new("Waiting for data...")
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, centered);
}
