use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::api::{Invoice, ListResource, Payment};
use crate::dashboard::ListView;
use crate::query::QueryCache;
use crate::ui::renderfns::{format_money, status_color};

/// Column layout for a list resource
pub trait TableRow: ListResource {
  const HEADERS: &'static [&'static str];

  fn widths() -> Vec<Constraint>;

  fn cells(&self) -> Vec<Cell<'static>>;
}

fn status_cell(status: &str) -> Cell<'static> {
  Cell::from(Span::styled(
    status.to_string(),
    Style::default().fg(status_color(status)),
  ))
}

impl TableRow for Payment {
  const HEADERS: &'static [&'static str] = &["ID", "Date", "Amount", "Status", "Description"];

  fn widths() -> Vec<Constraint> {
    vec![
      Constraint::Length(6),
      Constraint::Length(11),
      Constraint::Length(14),
      Constraint::Length(9),
      Constraint::Min(10),
    ]
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(self.id.to_string()),
      Cell::from(self.date.format("%Y-%m-%d").to_string()),
      Cell::from(Text::from(format_money(self.amount)).right_aligned()),
      status_cell(&self.status),
      Cell::from(self.description.clone()),
    ]
  }
}

impl TableRow for Invoice {
  const HEADERS: &'static [&'static str] = &["ID", "Date", "Due", "Customer", "Amount", "Status"];

  fn widths() -> Vec<Constraint> {
    vec![
      Constraint::Length(6),
      Constraint::Length(11),
      Constraint::Length(11),
      Constraint::Min(10),
      Constraint::Length(14),
      Constraint::Length(9),
    ]
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(self.id.to_string()),
      Cell::from(self.date.format("%Y-%m-%d").to_string()),
      Cell::from(self.due_date.format("%Y-%m-%d").to_string()),
      Cell::from(self.customer_name.clone()),
      Cell::from(Text::from(format_money(self.amount)).right_aligned()),
      status_cell(&self.status),
    ]
  }
}

/// Draw one page of a list resource with its pagination line
pub fn draw_table<T: TableRow>(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  view: &ListView<T>,
  cache: &QueryCache,
) {
  let result = view.result(cache);
  let filter = view.filter().unwrap_or("all");

  let state = if result.is_loading() {
    " (loading...)".to_string()
  } else if let Some(error) = &result.error {
    format!(" (error: {})", error)
  } else if result.is_fetching() {
    " (refreshing)".to_string()
  } else {
    String::new()
  };

  let block = Block::default()
    .title(format!(" {} [{}]{} ", title, filter, state))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(1), Constraint::Length(1)])
    .split(inner);

  let rows: Vec<Row> = result
    .data()
    .map(|records| records.iter().map(|r| Row::new(r.cells())).collect())
    .unwrap_or_default();

  if rows.is_empty() {
    let message = if result.is_loading() {
      "Loading..."
    } else {
      "No records"
    };
    let paragraph = Paragraph::new(message)
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center);
    frame.render_widget(paragraph, chunks[0]);
  } else {
    let header = Row::new(T::HEADERS.iter().copied())
      .style(Style::default().fg(Color::Yellow).bold())
      .bottom_margin(1);
    let table = Table::new(rows, T::widths()).header(header);
    frame.render_widget(table, chunks[0]);
  }

  draw_pagination(
    frame,
    chunks[1],
    view.page(),
    view.has_prev(),
    view.has_more(cache),
  );
}

fn draw_pagination(frame: &mut Frame, area: Rect, page: u32, has_prev: bool, has_more: bool) {
  let enabled = |on: bool| {
    if on {
      Style::default().fg(Color::Cyan)
    } else {
      Style::default().fg(Color::DarkGray)
    }
  };

  let line = Line::from(vec![
    Span::styled("◀ p ", enabled(has_prev)),
    Span::styled(format!(" page {} ", page), Style::default().fg(Color::White)),
    Span::styled(" n ▶", enabled(has_more)),
  ])
  .alignment(Alignment::Center);

  frame.render_widget(Paragraph::new(line), area);
}
