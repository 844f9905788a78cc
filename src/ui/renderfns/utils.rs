use ratatui::prelude::Color;

use crate::dates::ExpiryStatus;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.len() <= max_len {
    s.to_string()
  } else {
    format!("{}...", &s[..max_len.saturating_sub(3)])
  }
}

/// Display color for a product's expiry status
pub fn expiry_color(status: ExpiryStatus) -> Color {
  match status {
    ExpiryStatus::Ok => Color::White,
    ExpiryStatus::ExpiringSoon(_) => Color::Yellow,
    ExpiryStatus::Expired => Color::Red,
  }
}

/// Render a price with two decimals
pub fn format_price(price: f64) -> String {
  format!("{:.2}", price)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_expiry_colors() {
    assert_eq!(expiry_color(ExpiryStatus::Ok), Color::White);
    assert_eq!(expiry_color(ExpiryStatus::ExpiringSoon(1)), Color::Yellow);
    assert_eq!(expiry_color(ExpiryStatus::Expired), Color::Red);
  }

  #[test]
  fn test_format_price() {
    assert_eq!(format_price(1.5), "1.50");
    assert_eq!(format_price(0.0), "0.00");
  }
}
