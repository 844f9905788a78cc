use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Info,
  Success,
  Error,
}

impl ToastLevel {
  fn color(self) -> Color {
    match self {
      ToastLevel::Info => Color::Cyan,
      ToastLevel::Success => Color::Green,
      ToastLevel::Error => Color::Red,
    }
  }
}

/// A transient notification
#[derive(Debug, Clone)]
pub struct Toast {
  pub level: ToastLevel,
  pub message: String,
}

impl Toast {
  pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
    Self {
      level,
      message: message.into(),
    }
  }
}

/// Queue of active toasts; the newest is shown until it expires.
pub struct Toasts {
  queue: VecDeque<(Toast, Instant)>,
  lifetime: Duration,
}

impl Toasts {
  pub fn new() -> Self {
    Self {
      queue: VecDeque::new(),
      lifetime: Duration::from_secs(4),
    }
  }

  pub fn push(&mut self, toast: Toast) {
    self.queue.push_back((toast, Instant::now()));
  }

  /// Drop expired entries; call on every tick.
  pub fn tick(&mut self) {
    let lifetime = self.lifetime;
    while let Some((_, shown_at)) = self.queue.front() {
      if shown_at.elapsed() > lifetime {
        self.queue.pop_front();
      } else {
        break;
      }
    }
  }

  /// The toast currently on display.
  pub fn current(&self) -> Option<&Toast> {
    self.queue.back().map(|(toast, _)| toast)
  }

  /// Render the current toast right-aligned in the given line.
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let toast = match self.current() {
      Some(toast) => toast,
      None => return,
    };

    let line = Line::from(Span::styled(
      format!(" {} ", toast.message),
      Style::default().fg(toast.level.color()).bold(),
    ))
    .alignment(Alignment::Right);

    frame.render_widget(Paragraph::new(line), area);
  }
}

impl Default for Toasts {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_newest_toast_wins() {
    let mut toasts = Toasts::new();
    toasts.push(Toast::new(ToastLevel::Info, "first"));
    toasts.push(Toast::new(ToastLevel::Error, "second"));
    assert_eq!(toasts.current().unwrap().message, "second");
  }

  #[test]
  fn test_tick_keeps_fresh_toasts() {
    let mut toasts = Toasts::new();
    toasts.push(Toast::new(ToastLevel::Info, "fresh"));
    toasts.tick();
    assert!(toasts.current().is_some());
  }
}
