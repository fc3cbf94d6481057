use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::chat::{ChatSession, Role};
use crate::ui::components::TextInput;

/// Draw the conversation and the input line below it
pub fn draw_chat(
  frame: &mut Frame,
  area: Rect,
  chat: &ChatSession,
  input: &TextInput,
  focused: bool,
) {
  let border = if focused { Color::Yellow } else { Color::Blue };
  let title = match chat.last_reply_at() {
    Some(at) => format!(" Assistant (last reply {}) ", at.format("%H:%M")),
    None => " Assistant ".to_string(),
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(1), Constraint::Length(1)])
    .split(inner);

  let mut lines: Vec<Line> = Vec::new();
  for message in chat.messages() {
    let (label, color) = match message.role {
      Role::User => ("you", Color::Cyan),
      Role::Assistant => ("assistant", Color::Green),
    };
    lines.push(Line::from(vec![
      Span::styled(label, Style::default().fg(color).bold()),
      Span::styled(
        format!(" {}", message.timestamp.format("%H:%M")),
        Style::default().fg(Color::DarkGray),
      ),
    ]));
    lines.push(Line::from(message.content.clone()));
    lines.push(Line::default());
  }
  if chat.is_pending() {
    lines.push(Line::from(Span::styled(
      "Thinking...",
      Style::default().fg(Color::DarkGray).italic(),
    )));
  }

  // Keep the newest messages in view, counting rows after wrapping
  let conversation = Paragraph::new(lines).wrap(Wrap { trim: false });
  let rows = conversation.line_count(chunks[0].width);
  let scroll = rows.saturating_sub(chunks[0].height as usize);
  let conversation = conversation.scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
  frame.render_widget(conversation, chunks[0]);

  let prompt = if chat.is_pending() {
    Line::from(Span::styled("> waiting for reply", Style::default().fg(Color::DarkGray)))
  } else if focused {
    Line::from(vec![
      Span::styled("> ", Style::default().fg(Color::Yellow)),
      Span::raw(input.value().to_string()),
    ])
  } else {
    Line::from(Span::styled(
      "> press c to ask about invoices or payments",
      Style::default().fg(Color::DarkGray),
    ))
  };
  frame.render_widget(Paragraph::new(prompt), chunks[1]);

  if focused && !chat.is_pending() {
    let x = chunks[1].x + 2 + input.cursor_position() as u16;
    frame.set_cursor_position((x.min(chunks[1].right().saturating_sub(1)), chunks[1].y));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::AssistantReply;
  use chrono::{TimeZone, Utc};
  use ratatui::backend::TestBackend;

  fn rendered(chat: &ChatSession, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
      .draw(|frame| {
        let area = frame.area();
        draw_chat(frame, area, chat, &TextInput::new(), false)
      })
      .unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[tokio::test]
  async fn test_long_reply_is_scrolled_to_its_end() {
    let mut chat = ChatSession::new(|_query: String| async {
      Ok::<_, String>(AssistantReply {
        response: format!("{}NEWEST_END", "word ".repeat(60)),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
      })
    });
    chat.submit("hi").unwrap();
    for _ in 0..10 {
      tokio::task::yield_now().await;
    }
    assert!(chat.poll());

    // The reply wraps to more rows than the panel holds
    let screen = rendered(&chat, 40, 12);
    assert!(screen.contains("NEWEST_END"), "{}", screen);
    assert!(screen.contains("last reply 12:00"));
  }

  #[test]
  fn test_short_conversation_starts_at_top() {
    let chat = ChatSession::new(|_query: String| async {
      Err::<AssistantReply, _>("unused".to_string())
    })
    .with_greeting("Hello there");

    let screen = rendered(&chat, 40, 12);
    let rows: Vec<&str> = screen.lines().collect();
    assert!(rows[1].contains("assistant"));
    assert!(rows[2].contains("Hello there"));
    assert!(rows[0].contains(" Assistant "));
  }
}
