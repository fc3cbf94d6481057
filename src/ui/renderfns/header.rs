use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::dashboard::ListTab;

/// Draw the header bar with title, API host and the active tab
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, api_url: &str, tab: ListTab) {
  let host = extract_host(api_url);

  let tab_span = |t: ListTab| {
    let style = if t == tab {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {} ", t.title()), style)
  };

  let header = Line::from(vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    tab_span(ListTab::Payments),
    tab_span(ListTab::Invoices),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Host and port of the API URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(extract_host("http://localhost:8000/api"), "localhost:8000");
    assert_eq!(extract_host("https://books.example.com/api/v1"), "books.example.com");
    assert_eq!(extract_host("books.example.com"), "books.example.com");
  }
}
