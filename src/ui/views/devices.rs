use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::CacheKey;
use crate::query::{MutationOp, Query, QueryState};
use crate::scale::types::Device;
use crate::scale::CachedScaleClient;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{DeviceDetailView, DeviceFormView};

/// View for displaying the registered devices
pub struct DevicesView {
  client: CachedScaleClient,
  query: Query<Vec<Device>>,
  list_state: ListState,
  delete_op: MutationOp<String>,
  /// Device id and name awaiting delete confirmation
  confirm_delete: Option<(u64, String)>,
}

impl DevicesView {
  pub fn new(client: CachedScaleClient) -> Self {
    let client_for_query = client.clone();
    let mut query = Query::new(move || {
      let client = client_for_query.clone();
      async move { client.list_devices().await.map_err(|e| e.to_string()) }
    })
    .with_cache_key(CacheKey::Devices, client.invalidations());

    // Start fetching immediately
    query.fetch();

    Self {
      client,
      query,
      list_state: ListState::default(),
      delete_op: MutationOp::idle(),
      confirm_delete: None,
    }
  }

  fn devices(&self) -> &[Device] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_device(&self) -> Option<&Device> {
    self
      .list_state
      .selected()
      .and_then(|index| self.devices().get(index))
  }

  fn start_delete(&mut self, device_id: u64) {
    let client = self.client.clone();
    self.delete_op.start(async move {
      client
        .delete_device(device_id)
        .await
        .map_err(|e| e.to_string())?;
      Ok("Device deleted".to_string())
    });
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.devices().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Devices (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Devices (error: {}) ", e),
      _ => format!(" Devices ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.devices().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load devices. Press 'r' to retry."
      } else {
        "No devices registered. Press 'n' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .devices()
      .iter()
      .map(|device| {
        let auto = if device.auto_update.enabled {
          format!("auto {}m", device.auto_update.interval_minutes)
        } else {
          "-".to_string()
        };
        let dirty = if device.cached_dirty { "unpushed" } else { "" };

        let line = Line::from(vec![
          Span::styled(
            format!("{:<20}", truncate(&device.name, 20)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::raw(format!(
            "{:<22}",
            truncate(&format!("{}:{}", device.host, device.port), 22)
          )),
          Span::raw(" "),
          Span::raw(format!("{:<4}", device.protocol.to_string())),
          Span::raw(" "),
          Span::styled(format!("{:<9}", auto), Style::default().fg(Color::DarkGray)),
          Span::raw(" "),
          Span::styled(dirty, Style::default().fg(Color::Yellow)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_confirm(&self, frame: &mut Frame, area: Rect) {
    let (_, name) = match &self.confirm_delete {
      Some(pending) => pending,
      None => return,
    };

    let line = Line::from(vec![
      Span::styled(
        format!(" Delete device '{}'? ", name),
        Style::default().fg(Color::Red).bold(),
      ),
      Span::styled("y: confirm   any other key: cancel", Style::default().fg(Color::DarkGray)),
    ]);
    let row = Rect::new(area.x, area.y + area.height.saturating_sub(1), area.width, 1);
    frame.render_widget(Paragraph::new(line), row);
  }
}

impl View for DevicesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some((device_id, _)) = self.confirm_delete.take() {
      if key.code == KeyCode::Char('y') {
        self.start_delete(device_id);
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.query.refetch();
      }
      KeyCode::Char('n') => {
        return ViewAction::Push(Box::new(DeviceFormView::create(self.client.clone())));
      }
      KeyCode::Char('e') => {
        if let Some(device) = self.selected_device() {
          return ViewAction::Push(Box::new(DeviceFormView::edit(
            self.client.clone(),
            device,
          )));
        }
      }
      KeyCode::Char('d') => {
        if self.delete_op.in_flight() {
          return ViewAction::info("A delete is already in progress");
        }
        if let Some(device) = self.selected_device() {
          let pending = (device.id, device.name.clone());
          self.confirm_delete = Some(pending);
        }
      }
      KeyCode::Enter => {
        if let Some(device) = self.selected_device() {
          return ViewAction::Push(Box::new(DeviceDetailView::new(
            device.id,
            device.name.clone(),
            self.client.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.render_confirm(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Devices".to_string()
  }

  fn tick(&mut self) -> Vec<ViewAction> {
    self.query.poll();

    match self.delete_op.poll() {
      Some(Ok(message)) => vec![ViewAction::success(message)],
      Some(Err(message)) => vec![ViewAction::error(message)],
      None => Vec::new(),
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("n", "new").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(60),
    ]
  }
}
