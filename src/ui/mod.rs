pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::prelude::*;
use ratatui::widgets::ListState;

use crate::app::App;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    app.server_url(),
    app.title(),
    &app.shortcuts(),
  );

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  renderfns::draw_footer(frame, chunks[2], &app.breadcrumb());
  app.toasts().render(frame, chunks[2]);

  // Command overlay sits on top of everything
  app.command_input().render_overlay(frame, chunks[1]);
}

/// Keep a list selection inside bounds as the underlying data changes
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    Some(_) if len == 0 => state.select(None),
    Some(selected) if selected >= len => state.select(Some(len - 1)),
    None if len > 0 => state.select(Some(0)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection_empty_list() {
    let mut state = ListState::default();
    state.select(Some(3));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_ensure_valid_selection_clamps() {
    let mut state = ListState::default();
    state.select(Some(9));
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(3));
  }

  #[test]
  fn test_ensure_valid_selection_defaults_to_first() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_ensure_valid_selection_keeps_valid() {
    let mut state = ListState::default();
    state.select(Some(2));
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(2));
  }
}
