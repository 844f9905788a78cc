use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use super::components::{Toast, ToastLevel};

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input or an
/// async completion
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the whole stack with a new root view
  ReplaceRoot(Box<dyn View>),
  /// Show a transient notification
  Toast(Toast),
}

impl ViewAction {
  pub fn info(message: impl Into<String>) -> Self {
    ViewAction::Toast(Toast::new(ToastLevel::Info, message))
  }

  pub fn success(message: impl Into<String>) -> Self {
    ViewAction::Toast(Toast::new(ToastLevel::Success, message))
  }

  pub fn error(message: impl Into<String>) -> Self {
    ViewAction::Toast(Toast::new(ToastLevel::Error, message))
  }
}

/// Trait for view behavior
///
/// Views handle their own input modes (filter, edit, etc.) and return
/// actions for the App to execute. This creates a clean delegation
/// chain: App → View → Components
///
/// Views that load data asynchronously use Query/MutationOp internally
/// and poll them in the tick() method; actions produced by completed
/// operations (success toasts, pops) are returned from tick().
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to allow views to poll async operations
  fn tick(&mut self) -> Vec<ViewAction> {
    Vec::new()
  }

  /// Whether this view needs an authenticated session. The auth view
  /// overrides this; everything else is reset to it when the session
  /// token disappears.
  fn requires_auth(&self) -> bool {
    true
  }

  /// Whether the view is currently capturing free-form text (a focused
  /// form field or filter). While true, the command palette must not
  /// steal the `:` key.
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
