use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

use crate::summary::SeriesPoint;

/// Draw the monthly payments/invoices bar chart
pub fn draw_chart(frame: &mut Frame, area: Rect, series: &[SeriesPoint], loading: bool) {
  let block = Block::default()
    .title(Line::from(vec![
      Span::raw(" Monthly "),
      Span::styled("■ payments ", Style::default().fg(Color::Green)),
      Span::styled("■ invoices ", Style::default().fg(Color::Blue)),
    ]))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if series.is_empty() {
    let message = if loading { "Loading..." } else { "No monthly data" };
    let paragraph = Paragraph::new(message)
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  let groups: Vec<BarGroup> = series
    .iter()
    .map(|point| {
      BarGroup::default()
        .label(Line::from(point.name.clone()))
        .bars(&[
          Bar::default()
            .value(point.payments.max(0) as u64)
            .style(Style::default().fg(Color::Green)),
          Bar::default()
            .value(point.invoices.max(0) as u64)
            .style(Style::default().fg(Color::Blue)),
        ])
    })
    .collect();

  let mut chart = BarChart::default()
    .block(block)
    .bar_width(3)
    .bar_gap(0)
    .group_gap(2);
  for group in groups {
    chart = chart.data(group);
  }

  frame.render_widget(chart, area);
}
