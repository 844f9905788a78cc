use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::ShortcutInfo;

/// Draw the header bar with logo, server context, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  server_url: &str,
  title: Option<&str>,
  shortcuts: &[ShortcutInfo],
) {
  let context = title
    .map(str::to_string)
    .unwrap_or_else(|| extract_domain(server_url).to_string());

  let mut spans = vec![
    Span::styled(" s9s ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", context), Style::default().fg(Color::White)),
    Span::raw("  "),
  ];

  // Shortcuts - keys highlighted, descriptions dimmed
  let mut ordered: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  ordered.sort_by_key(|s| s.priority);
  for shortcut in ordered {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract domain from the server URL
fn extract_domain(url: &str) -> &str {
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
  fn test_extract_domain() {
    assert_eq!(
      extract_domain("https://scales.example.com"),
      "scales.example.com"
    );
    assert_eq!(
      extract_domain("https://scales.example.com/api"),
      "scales.example.com"
    );
    assert_eq!(extract_domain("http://localhost:8000"), "localhost:8000");
  }
}
