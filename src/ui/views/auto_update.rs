use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::cache::CacheKey;
use crate::query::{MutationOp, Query, QueryState};
use crate::scale::types::AutoUpdateSettings;
use crate::scale::CachedScaleClient;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

const INTERVAL: usize = 0;

/// Auto-update settings for one device: an enabled toggle and the
/// refresh interval in minutes.
pub struct AutoUpdateView {
  device_id: u64,
  client: CachedScaleClient,
  query: Query<AutoUpdateSettings>,
  enabled: bool,
  /// Local edit state has been seeded from the loaded settings
  seeded: bool,
  form: Form,
  op: MutationOp<String>,
}

impl AutoUpdateView {
  pub fn new(device_id: u64, client: CachedScaleClient) -> Self {
    let client_for_query = client.clone();
    let mut query = Query::new(move || {
      let client = client_for_query.clone();
      async move { client.auto_update(device_id).await.map_err(|e| e.to_string()) }
    })
    .with_cache_key(CacheKey::AutoUpdate { device_id }, client.invalidations());

    query.fetch();

    Self {
      device_id,
      client,
      query,
      enabled: false,
      seeded: false,
      form: Form::new(vec![FormField::new("interval (minutes)")
        .validated(validate_interval)]),
      op: MutationOp::idle(),
    }
  }

  fn submit(&mut self) {
    let interval: f64 = self
      .form
      .value(INTERVAL)
      .trim()
      .parse()
      .unwrap_or(f64::NAN);

    let client = self.client.clone();
    let device_id = self.device_id;
    let enabled = self.enabled;
    self.op.start(async move {
      // The client truncates and bounds the interval before the write.
      client
        .set_auto_update(device_id, enabled, interval)
        .await
        .map_err(|e| e.to_string())?;
      Ok("Auto-update settings saved".to_string())
    });
  }
}

impl View for AutoUpdateView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('t') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.enabled = !self.enabled;
      return ViewAction::None;
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        if !self.op.in_flight() {
          self.submit();
        }
        ViewAction::None
      }
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match (self.query.state(), self.op.in_flight()) {
      (QueryState::Loading, _) => format!(" Auto-update · device {} (loading...) ", self.device_id),
      (QueryState::Error(e), _) => {
        format!(" Auto-update · device {} (error: {}) ", self.device_id, e)
      }
      (_, true) => format!(" Auto-update · device {} (saving...) ", self.device_id),
      _ => format!(" Auto-update · device {} ", self.device_id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 4 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Enabled toggle
        Constraint::Length(1), // Interval field
        Constraint::Length(1), // Last run
        Constraint::Min(0),    // Hint
      ])
      .split(inner);

    let toggle = Line::from(vec![
      Span::styled(" enabled: ", Style::default().fg(Color::DarkGray)),
      if self.enabled {
        Span::styled("[x]", Style::default().fg(Color::Green).bold())
      } else {
        Span::styled("[ ]", Style::default().fg(Color::Gray))
      },
    ]);
    frame.render_widget(Paragraph::new(toggle), chunks[0]);

    self.form.render(frame, chunks[1]);

    let last_run = self
      .query
      .data()
      .and_then(|settings| settings.last_run_utc)
      .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
      .unwrap_or_else(|| "never".to_string());
    frame.render_widget(
      Paragraph::new(Line::from(vec![
        Span::styled(" last run: ", Style::default().fg(Color::DarkGray)),
        Span::raw(last_run),
      ])),
      chunks[2],
    );

    frame.render_widget(
      Paragraph::new(" Ctrl-T: toggle enabled   Enter: save   Esc: back")
        .style(Style::default().fg(Color::DarkGray)),
      chunks[3],
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Auto-update".to_string()
  }

  fn tick(&mut self) -> Vec<ViewAction> {
    if self.query.poll() && !self.seeded {
      if let Some(settings) = self.query.data() {
        self.enabled = settings.enabled;
        let interval = settings.interval_minutes.to_string();
        self.form = Form::new(vec![FormField::new("interval (minutes)")
          .with_value(interval)
          .validated(validate_interval)]);
        self.seeded = true;
      }
    }

    match self.op.poll() {
      Some(Ok(message)) => vec![ViewAction::success(message), ViewAction::Pop],
      Some(Err(message)) => vec![ViewAction::error(message)],
      None => Vec::new(),
    }
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Ctrl-T", "toggle").with_priority(10),
      ShortcutInfo::new("Enter", "save").with_priority(20),
      ShortcutInfo::new("Esc", "back").with_priority(30),
    ]
  }
}

fn validate_interval(value: &str) -> Option<String> {
  match value.trim().parse::<f64>() {
    Ok(minutes) if minutes.is_finite() && minutes >= 1.0 => None,
    _ => Some("Interval must be at least 1 minute".to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_interval() {
    assert!(validate_interval("15").is_none());
    assert!(validate_interval("15.9").is_none());
    assert!(validate_interval("1").is_none());
    assert!(validate_interval("0").is_some());
    assert!(validate_interval("-5").is_some());
    assert!(validate_interval("abc").is_some());
    assert!(validate_interval("").is_some());
  }
}
