use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::api::AgentLog;
use crate::query::{QueryResult, QueryStatus};
use crate::ui::renderfns::truncate;

fn event_color(event_type: &str) -> Color {
  match event_type {
    "assistant_query" => Color::Magenta,
    "summary_call" => Color::Cyan,
    "agent_request" => Color::Blue,
    _ => Color::White,
  }
}

/// Draw the rolling activity log
pub fn draw_logs(frame: &mut Frame, area: Rect, result: &QueryResult<Vec<AgentLog>>) {
  let title = match result.status {
    QueryStatus::Error => " Activity (error) ",
    QueryStatus::Loading if result.data().is_some() => " Activity (refreshing) ",
    _ => " Activity ",
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let logs = match result.data() {
    Some(logs) if !logs.is_empty() => logs,
    _ => {
      let (message, color) = if result.is_loading() {
        ("Loading...".to_string(), Color::DarkGray)
      } else if let Some(error) = &result.error {
        (format!("Error: {}", error), Color::Red)
      } else {
        ("No activity yet".to_string(), Color::DarkGray)
      };
      let paragraph = Paragraph::new(message)
        .style(Style::default().fg(color))
        .block(block);
      frame.render_widget(paragraph, area);
      return;
    }
  };

  let width = area.width.saturating_sub(2) as usize;
  let items: Vec<ListItem> = logs
    .iter()
    .map(|log| {
      let mut spans = vec![
        Span::styled(
          format!("{} ", log.timestamp.format("%H:%M:%S")),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          format!("{:<16} ", log.event_type),
          Style::default().fg(event_color(&log.event_type)),
        ),
      ];
      match &log.error {
        Some(error) => spans.push(Span::styled(
          truncate(error, width.saturating_sub(26)),
          Style::default().fg(Color::Red),
        )),
        None => spans.push(Span::raw(truncate(&log.details, width.saturating_sub(26)))),
      }
      ListItem::new(Line::from(spans))
    })
    .collect();

  frame.render_widget(List::new(items).block(block), area);
}
