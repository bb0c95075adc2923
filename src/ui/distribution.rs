//! Category distribution as a bar chart with percentage labels.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use super::ChartView;
use crate::render::{Distribution, Slice};

/// Narrowest bar worth drawing.
const MIN_BAR_WIDTH: u16 = 3;

/// Percentage label for a slice, e.g. `33.3%`.
pub fn percent_label(proportion: f64) -> String {
    format!("{:.1}%", proportion * 100.0)
}

/// Bar width that fits `bars` bars (with one-column gaps) into `width`.
fn bar_width(width: u16, bars: usize) -> u16 {
    let bars = bars.max(1);
    let gaps = bars - 1;
    let width = (usize::from(width).saturating_sub(gaps) / bars)
        .clamp(usize::from(MIN_BAR_WIDTH), 20);
    // Clamped to 20, so the narrowing is lossless.
    width as u16
}

/// How many bars of at least [`MIN_BAR_WIDTH`] fit into `width`.
fn max_bars(width: u16) -> usize {
    (usize::from(width) + 1) / (usize::from(MIN_BAR_WIDTH) + 1)
}

/// The `limit` largest slices, kept in label order.
fn visible_slices(slices: &[Slice], limit: usize) -> Vec<(usize, &Slice)> {
    if slices.len() <= limit {
        return slices.iter().enumerate().collect();
    }
    let mut ranked: Vec<(usize, &Slice)> = slices.iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.sort_by_key(|(i, _)| *i);
    ranked
}

pub fn render(frame: &mut Frame, view: &ChartView, dist: &Distribution, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", view.title))
        .title_style(view.theme.header)
        .borders(Borders::ALL)
        .border_type(view.theme.border_type)
        .border_style(Style::default().fg(view.theme.border));

    let inner_width = block.inner(area).width;
    let bars: Vec<Bar> = visible_slices(&dist.slices, max_bars(inner_width))
        .into_iter()
        .map(|(i, slice)| {
            let color = view.theme.slice_color(i);
            Bar::default()
                .value(slice.count)
                .label(Line::from(slice.label.clone()))
                .text_value(percent_label(slice.proportion))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(color).add_modifier(Modifier::REVERSED))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(inner_width, bars.len()))
        .bar_gap(1);

    frame.render_widget(chart, area);
}
