use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::query::MutationOp;
use crate::scale::{ApiError, CachedScaleClient};
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::DevicesView;

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const CONFIRM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
  Login,
  Register,
}

/// Login / registration view shown whenever there is no session token.
pub struct AuthView {
  client: CachedScaleClient,
  mode: AuthMode,
  form: Form,
  op: MutationOp<()>,
}

impl AuthView {
  pub fn new(client: CachedScaleClient, default_email: Option<String>) -> Self {
    let form = Self::build_form(AuthMode::Login, default_email.unwrap_or_default());
    Self {
      client,
      mode: AuthMode::Login,
      form,
      op: MutationOp::idle(),
    }
  }

  fn build_form(mode: AuthMode, email: String) -> Form {
    let mut fields = vec![
      FormField::new("email").with_value(email).validated(validate_email),
      FormField::new("password").secret().validated(validate_password_present),
    ];
    if mode == AuthMode::Register {
      fields[PASSWORD] = FormField::new("password").secret().validated(validate_new_password);
      fields.push(FormField::new("confirm").secret());
    }
    Form::new(fields)
  }

  fn toggle_mode(&mut self) {
    self.mode = match self.mode {
      AuthMode::Login => AuthMode::Register,
      AuthMode::Register => AuthMode::Login,
    };
    let email = self.form.value(EMAIL).to_string();
    self.form = Self::build_form(self.mode, email);
  }

  fn submit(&mut self) {
    if self.mode == AuthMode::Register && self.form.value(PASSWORD) != self.form.value(CONFIRM) {
      self
        .form
        .field_mut(CONFIRM)
        .set_error(Some("Passwords do not match".to_string()));
      return;
    }

    let client = self.client.clone();
    let mode = self.mode;
    let email = self.form.value(EMAIL).to_string();
    let password = self.form.value(PASSWORD).to_string();

    self.op.start(async move {
      if mode == AuthMode::Register {
        client
          .register(&email, &password)
          .await
          .map_err(|e| e.to_string())?;
      }
      client.login(&email, &password).await.map_err(|e| match e {
        // A 401 here just means wrong credentials, not an expired session.
        ApiError::Unauthorized => "Invalid email or password".to_string(),
        other => other.to_string(),
      })
    });
  }
}

impl View for AuthView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.toggle_mode();
      return ViewAction::None;
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        // Submission is disabled while a request is outstanding.
        if !self.op.in_flight() {
          self.submit();
        }
        ViewAction::None
      }
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      KeyResult::Handled => ViewAction::None,
      KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match (self.mode, self.op.in_flight()) {
      (AuthMode::Login, false) => " Log in ".to_string(),
      (AuthMode::Login, true) => " Log in (authenticating...) ".to_string(),
      (AuthMode::Register, false) => " Register ".to_string(),
      (AuthMode::Register, true) => " Register (authenticating...) ".to_string(),
    };

    let width = (area.width * 60 / 100).clamp(40, 70);
    let height = 8;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 3;
    let box_area = Rect::new(x, y, width, height.min(area.height));

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    if inner.height < 2 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    self.form.render(frame, chunks[0]);

    let hint = match self.mode {
      AuthMode::Login => " Enter: log in   Ctrl-R: register instead",
      AuthMode::Register => " Enter: register   Ctrl-R: log in instead",
    };
    frame.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      chunks[1],
    );
  }

  fn breadcrumb_label(&self) -> String {
    match self.mode {
      AuthMode::Login => "Login".to_string(),
      AuthMode::Register => "Register".to_string(),
    }
  }

  fn tick(&mut self) -> Vec<ViewAction> {
    match self.op.poll() {
      Some(Ok(())) => vec![
        ViewAction::success("Logged in"),
        ViewAction::ReplaceRoot(Box::new(DevicesView::new(self.client.clone()))),
      ],
      Some(Err(message)) => vec![ViewAction::error(message)],
      None => Vec::new(),
    }
  }

  fn requires_auth(&self) -> bool {
    false
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Tab", "next field").with_priority(10),
      ShortcutInfo::new("Enter", "submit").with_priority(20),
      ShortcutInfo::new("Ctrl-R", "login/register").with_priority(30),
    ]
  }
}

/// Minimal shape check; the server does the real validation.
fn validate_email(value: &str) -> Option<String> {
  let value = value.trim();
  if value.is_empty() {
    return Some("Email is required".to_string());
  }
  let valid = value.split_once('@').is_some_and(|(local, domain)| {
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
  });
  if valid {
    None
  } else {
    Some("Invalid email address".to_string())
  }
}

fn validate_password_present(value: &str) -> Option<String> {
  if value.is_empty() {
    Some("Password is required".to_string())
  } else {
    None
  }
}

fn validate_new_password(value: &str) -> Option<String> {
  if value.chars().count() < 8 {
    Some("Password must be at least 8 characters".to_string())
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_email() {
    assert!(validate_email("ops@example.com").is_none());
    assert!(validate_email("").is_some());
    assert!(validate_email("no-at-sign").is_some());
    assert!(validate_email("a@nodot").is_some());
    assert!(validate_email("a@.com").is_some());
  }

  #[test]
  fn test_validate_password_present() {
    assert!(validate_password_present("x").is_none());
    assert!(validate_password_present("").is_some());
  }

  #[test]
  fn test_validate_new_password_length() {
    assert!(validate_new_password("longenough").is_none());
    assert!(validate_new_password("short").is_some());
  }
}
