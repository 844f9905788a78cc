use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::query::MutationOp;
use crate::scale::types::{Device, DeviceDraft, Protocol};
use crate::scale::CachedScaleClient;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

const NAME: usize = 0;
const DESCRIPTION: usize = 1;
const HOST: usize = 2;
const PORT: usize = 3;
const PROTOCOL: usize = 4;

/// Create / edit form for a device record
pub struct DeviceFormView {
  client: CachedScaleClient,
  /// Present when editing an existing device
  device_id: Option<u64>,
  form: Form,
  op: MutationOp<String>,
}

impl DeviceFormView {
  pub fn create(client: CachedScaleClient) -> Self {
    Self {
      client,
      device_id: None,
      form: Self::build_form(None),
      op: MutationOp::idle(),
    }
  }

  pub fn edit(client: CachedScaleClient, device: &Device) -> Self {
    Self {
      client,
      device_id: Some(device.id),
      form: Self::build_form(Some(device)),
      op: MutationOp::idle(),
    }
  }

  fn build_form(device: Option<&Device>) -> Form {
    let (name, description, host, port, protocol) = match device {
      Some(d) => (
        d.name.clone(),
        d.description.clone(),
        d.host.clone(),
        d.port.to_string(),
        d.protocol.to_string(),
      ),
      None => (
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        Protocol::Tcp.to_string(),
      ),
    };

    Form::new(vec![
      FormField::new("name").with_value(name).validated(validate_name),
      FormField::new("description").with_value(description),
      FormField::new("host").with_value(host).validated(validate_host),
      FormField::new("port").with_value(port).validated(validate_port),
      FormField::new("protocol")
        .with_value(protocol)
        .validated(validate_protocol),
    ])
  }

  fn submit(&mut self) {
    // Validated by the form before FormEvent::Submitted fires.
    let draft = DeviceDraft {
      name: self.form.value(NAME).trim().to_string(),
      description: self.form.value(DESCRIPTION).trim().to_string(),
      host: self.form.value(HOST).trim().to_string(),
      port: self.form.value(PORT).trim().parse().unwrap_or(0),
      protocol: parse_protocol(self.form.value(PROTOCOL)).unwrap_or_default(),
    };

    let client = self.client.clone();
    let device_id = self.device_id;
    self.op.start(async move {
      match device_id {
        Some(id) => {
          client
            .update_device(id, &draft)
            .await
            .map_err(|e| e.to_string())?;
          Ok("Device updated".to_string())
        }
        None => {
          client.create_device(&draft).await.map_err(|e| e.to_string())?;
          Ok("Device created".to_string())
        }
      }
    });
  }
}

impl View for DeviceFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
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
    let title = match (self.device_id, self.op.in_flight()) {
      (None, false) => " New device ".to_string(),
      (None, true) => " New device (saving...) ".to_string(),
      (Some(id), false) => format!(" Edit device {} ", id),
      (Some(id), true) => format!(" Edit device {} (saving...) ", id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(6), Constraint::Min(0)])
      .split(inner);

    self.form.render(frame, chunks[0]);

    frame.render_widget(
      Paragraph::new(" Enter: save   Esc: cancel   Tab: next field")
        .style(Style::default().fg(Color::DarkGray)),
      chunks[1],
    );
  }

  fn breadcrumb_label(&self) -> String {
    match self.device_id {
      Some(id) => format!("Edit {}", id),
      None => "New device".to_string(),
    }
  }

  fn tick(&mut self) -> Vec<ViewAction> {
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
      ShortcutInfo::new("Tab", "next field").with_priority(10),
      ShortcutInfo::new("Enter", "save").with_priority(20),
      ShortcutInfo::new("Esc", "cancel").with_priority(30),
    ]
  }
}

fn validate_name(value: &str) -> Option<String> {
  if value.trim().is_empty() {
    Some("Name is required".to_string())
  } else {
    None
  }
}

/// Accept an IP address or hostname; the server resolves it.
fn validate_host(value: &str) -> Option<String> {
  let value = value.trim();
  if value.is_empty() {
    return Some("Host is required".to_string());
  }
  let valid = value
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
  if valid {
    None
  } else {
    Some("Invalid host or IP address".to_string())
  }
}

fn validate_port(value: &str) -> Option<String> {
  match value.trim().parse::<u16>() {
    Ok(port) if port >= 1 => None,
    _ => Some("Port must be 1-65535".to_string()),
  }
}

fn validate_protocol(value: &str) -> Option<String> {
  if parse_protocol(value).is_some() {
    None
  } else {
    Some("Protocol must be TCP or UDP".to_string())
  }
}

fn parse_protocol(value: &str) -> Option<Protocol> {
  match value.trim().to_uppercase().as_str() {
    "TCP" => Some(Protocol::Tcp),
    "UDP" => Some(Protocol::Udp),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_name() {
    assert!(validate_name("deli scale").is_none());
    assert!(validate_name("   ").is_some());
  }

  #[test]
  fn test_validate_host() {
    assert!(validate_host("10.0.0.5").is_none());
    assert!(validate_host("scale-01.local").is_none());
    assert!(validate_host("").is_some());
    assert!(validate_host("bad host").is_some());
  }

  #[test]
  fn test_validate_port_range() {
    assert!(validate_port("1").is_none());
    assert!(validate_port("65535").is_none());
    assert!(validate_port("0").is_some());
    assert!(validate_port("65536").is_some());
    assert!(validate_port("abc").is_some());
    assert!(validate_port("").is_some());
  }

  #[test]
  fn test_validate_protocol() {
    assert!(validate_protocol("TCP").is_none());
    assert!(validate_protocol("udp").is_none());
    assert!(validate_protocol("http").is_some());
  }
}
