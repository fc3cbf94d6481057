use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Focus;

const DASHBOARD_HINTS: &[(&str, &str)] = &[
  ("Tab", "switch"),
  ("n/p", "page"),
  ("f", "filter"),
  ("r", "refresh"),
  ("c", "chat"),
  ("q", "quit"),
];

const CHAT_HINTS: &[(&str, &str)] = &[("Enter", "send"), ("Esc", "leave chat"), ("Ctrl-C", "quit")];

/// Draw the footer bar with key hints and the latest status message
pub fn draw_footer(frame: &mut Frame, area: Rect, focus: Focus, status: Option<&str>) {
  let hints = match focus {
    Focus::Dashboard => DASHBOARD_HINTS,
    Focus::Chat => CHAT_HINTS,
  };

  let mut spans = vec![Span::raw(" ")];
  for (key, action) in hints {
    spans.push(Span::styled(format!("<{}>", key), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
      format!(" {}   ", action),
      Style::default().fg(Color::DarkGray),
    ));
  }

  if let Some(status) = status {
    spans.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(status.to_string(), Style::default().fg(Color::Red)));
  }

  let line = Line::from(spans);
  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
