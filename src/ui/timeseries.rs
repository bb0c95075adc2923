//! Metric line chart with threshold reference lines and the alert marker.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::ChartView;
use crate::render::TimeSeries;

/// Title suffix describing the alert state.
pub fn alert_label(series: &TimeSeries) -> String {
    if series.alert.active {
        format!("ALERT mean {:.2} ≥ {}", series.mean, series.upper)
    } else {
        format!("ok mean {:.2}", series.mean)
    }
}

fn axis_labels(lo: f64, hi: f64) -> Vec<Span<'static>> {
    let mid = (lo + hi) / 2.0;
    vec![
        Span::raw(format!("{lo:.1}")),
        Span::raw(format!("{mid:.1}")),
        Span::raw(format!("{hi:.1}")),
    ]
}

pub fn render(frame: &mut Frame, view: &ChartView, series: &TimeSeries, area: Rect) {
    let (x_lo, x_hi) = series.x_bounds();
    let (y_lo, y_hi) = series.y_bounds();

    let upper = [(x_lo, series.upper), (x_hi, series.upper)];
    let lower = [(x_lo, series.lower), (x_hi, series.lower)];

    let line_style = if series.alert.active {
        Style::default().fg(view.theme.alert)
    } else {
        Style::default().fg(view.theme.series)
    };

    let datasets = vec![
        Dataset::default()
            .name("metric")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(line_style)
            .data(&series.points),
        Dataset::default()
            .name(format!("upper {}", series.upper))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(view.theme.alert).add_modifier(Modifier::DIM))
            .data(&upper),
        Dataset::default()
            .name(format!("lower {}", series.lower))
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(view.theme.ok).add_modifier(Modifier::DIM))
            .data(&lower),
    ];

    let title = Line::from(vec![
        Span::styled(format!(" {} ", view.title), view.theme.header),
        Span::raw("│ "),
        Span::styled(
            format!("{} ", alert_label(series)),
            view.theme.alert_style(series.alert.active),
        ),
    ]);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(view.theme.border_type)
        .border_style(Style::default().fg(view.theme.border));

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("seconds")
                .style(Style::default().fg(view.theme.border))
                .bounds([x_lo, x_hi])
                .labels(axis_labels(x_lo, x_hi)),
        )
        .y_axis(
            Axis::default()
                .title("value")
                .style(Style::default().fg(view.theme.border))
                .bounds([y_lo, y_hi])
                .labels(axis_labels(y_lo, y_hi)),
        );

    frame.render_widget(chart, area);
}
