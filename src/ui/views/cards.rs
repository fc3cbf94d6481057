use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::api::Summary;
use crate::query::QueryResult;
use crate::summary::monthly_average;
use crate::ui::renderfns::format_money;

/// Draw the row of summary figure cards
pub fn draw_summary_cards(frame: &mut Frame, area: Rect, result: &QueryResult<Summary>) {
  let columns = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);

  let cards: [(&str, String, Color); 4] = match result.data() {
    Some(summary) => [
      ("Total Payments", format_money(summary.total_payments), Color::Green),
      ("Total Invoices", format_money(summary.total_invoices), Color::Blue),
      (
        "Unpaid Invoices",
        format!(
          "{} ({})",
          summary.unpaid_invoices_count,
          format_money(summary.unpaid_invoices_amount)
        ),
        Color::Yellow,
      ),
      ("Monthly Average", format_money(monthly_average(summary)), Color::Magenta),
    ],
    None => {
      let placeholder = if result.is_error() { "error" } else { "loading..." };
      [
        ("Total Payments", placeholder.to_string(), Color::DarkGray),
        ("Total Invoices", placeholder.to_string(), Color::DarkGray),
        ("Unpaid Invoices", placeholder.to_string(), Color::DarkGray),
        ("Monthly Average", placeholder.to_string(), Color::DarkGray),
      ]
    }
  };

  for ((title, value, color), area) in cards.into_iter().zip(columns.iter()) {
    let block = Block::default()
      .title(format!(" {} ", title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(Line::from(Span::styled(
      value,
      Style::default().fg(color).bold(),
    )))
    .alignment(Alignment::Center)
    .block(block);

    frame.render_widget(paragraph, *area);
  }
}
