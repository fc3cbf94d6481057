pub mod components;
mod renderfns;
mod views;

use crate::app::{App, Focus};
use crate::dashboard::ListTab;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(3), // Summary cards
      Constraint::Percentage(40),
      Constraint::Min(8),    // Table and chat
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let dashboard = app.dashboard();

  renderfns::draw_header(
    frame,
    chunks[0],
    app.title(),
    app.api_url(),
    app.tab(),
  );

  let summary = dashboard.summary();
  views::draw_summary_cards(frame, chunks[1], &summary);

  let middle = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(chunks[2]);
  views::draw_chart(frame, middle[0], &dashboard.chart(), summary.is_loading());
  views::draw_logs(frame, middle[1], &dashboard.logs());

  let bottom = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
    .split(chunks[3]);
  let cache = dashboard.cache();
  match app.tab() {
    ListTab::Payments => {
      views::draw_table(frame, bottom[0], "Payments", dashboard.payments(), cache)
    }
    ListTab::Invoices => {
      views::draw_table(frame, bottom[0], "Invoices", dashboard.invoices(), cache)
    }
  }
  views::draw_chat(
    frame,
    bottom[1],
    dashboard.chat(),
    app.chat_input(),
    app.focus() == Focus::Chat,
  );

  renderfns::draw_footer(frame, chunks[4], app.focus(), app.status().as_deref());
}
