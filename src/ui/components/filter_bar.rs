use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the filter bar that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
  /// Filter text changed (emitted on each keystroke, empty on cancel)
  Changed(String),
  /// Filter submitted (overlay closed, filter persists)
  Submitted,
}

/// Incremental list filter with activation/deactivation
#[derive(Debug, Clone, Default)]
pub struct FilterBar {
  input: TextInput,
  active: bool,
}

impl FilterBar {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if the filter overlay is currently open
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Current filter text (persists after the overlay closes)
  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.active = true;
        self.input.clear();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(FilterEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(FilterEvent::Changed(String::new()))
      }
      InputResult::Consumed => {
        KeyResult::Event(FilterEvent::Changed(self.input.value().to_string()))
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render the filter overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filter ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_activation_and_typing() {
    let mut filter = FilterBar::new();
    assert_eq!(filter.handle_key(key(KeyCode::Char('/'))), KeyResult::Handled);
    assert!(filter.is_active());

    assert_eq!(
      filter.handle_key(key(KeyCode::Char('b'))),
      KeyResult::Event(FilterEvent::Changed("b".to_string()))
    );
  }

  #[test]
  fn test_cancel_clears_filter() {
    let mut filter = FilterBar::new();
    filter.handle_key(key(KeyCode::Char('/')));
    filter.handle_key(key(KeyCode::Char('b')));

    assert_eq!(
      filter.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FilterEvent::Changed(String::new()))
    );
    assert_eq!(filter.query(), "");
  }

  #[test]
  fn test_submit_keeps_filter() {
    let mut filter = FilterBar::new();
    filter.handle_key(key(KeyCode::Char('/')));
    filter.handle_key(key(KeyCode::Char('b')));
    filter.handle_key(key(KeyCode::Enter));

    assert!(!filter.is_active());
    assert_eq!(filter.query(), "b");
  }
}
