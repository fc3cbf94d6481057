use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a payment or invoice status
pub fn status_color(status: &str) -> Color {
  match status {
    "paid" => Color::Green,
    "pending" | "unpaid" => Color::Yellow,
    "failed" | "overdue" => Color::Red,
    _ => Color::White,
  }
}

/// Format an amount as dollars with thousands separators
pub fn format_money(amount: f64) -> String {
  let cents = (amount.abs() * 100.0).round() as u64;
  let whole = (cents / 100).to_string();

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, digit) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(digit);
  }

  let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
  format!("{}${}.{:02}", sign, grouped, cents % 100)
}
