use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph};

use crate::cache::CacheKey;
use crate::query::{MutationOp, Query, QueryState};
use crate::scale::types::{Device, Product};
use crate::scale::CachedScaleClient;
use crate::ui::components::{FilterBar, FilterEvent, KeyResult};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{expiry_color, format_price, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{AutoUpdateView, DeviceFormView, ProductEditView};

/// Device header plus the cached product table.
///
/// The device record and the product list are independent queries; they
/// load in parallel and each re-fetches when an invalidation group
/// touches its key.
pub struct DeviceDetailView {
  device_id: u64,
  device_name: String,
  client: CachedScaleClient,

  device: Query<Device>,
  products: Query<Vec<Product>>,

  list_state: ListState,
  filter: FilterBar,

  fetch_op: MutationOp<String>,
  push_op: MutationOp<String>,
}

impl DeviceDetailView {
  pub fn new(device_id: u64, device_name: String, client: CachedScaleClient) -> Self {
    let invalidations = client.invalidations();

    let client_for_device = client.clone();
    let mut device = Query::new(move || {
      let client = client_for_device.clone();
      async move { client.get_device(device_id).await.map_err(|e| e.to_string()) }
    })
    .with_cache_key(CacheKey::Device { device_id }, invalidations.clone());

    let client_for_products = client.clone();
    let mut products = Query::new(move || {
      let client = client_for_products.clone();
      async move {
        client
          .cached_products(device_id)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .with_cache_key(CacheKey::ProductsCached { device_id }, invalidations);

    // Both start immediately and load in parallel
    device.fetch();
    products.fetch();

    Self {
      device_id,
      device_name,
      client,
      device,
      products,
      list_state: ListState::default(),
      filter: FilterBar::new(),
      fetch_op: MutationOp::idle(),
      push_op: MutationOp::idle(),
    }
  }

  fn products(&self) -> &[Product] {
    self.products.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Products matching the filter text (name substring or PLU prefix).
  fn filtered_products(&self) -> Vec<&Product> {
    let query = self.filter.query().trim().to_lowercase();
    self
      .products()
      .iter()
      .filter(|product| {
        query.is_empty()
          || product.name.to_lowercase().contains(&query)
          || product.plu.to_string().starts_with(&query)
      })
      .collect()
  }

  fn selected_product(&self) -> Option<Product> {
    let filtered = self.filtered_products();
    self
      .list_state
      .selected()
      .and_then(|index| filtered.get(index))
      .map(|product| (*product).clone())
  }

  fn start_fetch_products(&mut self) -> ViewAction {
    let client = self.client.clone();
    let device_id = self.device_id;
    let started = self.fetch_op.start(async move {
      client
        .fetch_products(device_id)
        .await
        .map_err(|e| e.to_string())?;
      Ok("Fetched product catalog from device".to_string())
    });
    if started {
      ViewAction::info("Fetching product catalog...")
    } else {
      ViewAction::info("A fetch is already in progress")
    }
  }

  fn start_push(&mut self) -> ViewAction {
    let client = self.client.clone();
    let device_id = self.device_id;
    let started = self.push_op.start(async move {
      client
        .push_products(device_id)
        .await
        .map_err(|e| e.to_string())?;
      Ok("Pushed cached products to device".to_string())
    });
    if started {
      ViewAction::info("Pushing cache to device...")
    } else {
      ViewAction::info("A push is already in progress")
    }
  }

  fn render_header(&self, frame: &mut Frame, area: Rect) {
    let device = match self.device.data() {
      Some(device) => device,
      None => {
        let text = match self.device.state() {
          QueryState::Error(e) => format!("Failed to load device: {}", e),
          _ => "Loading device...".to_string(),
        };
        frame.render_widget(
          Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
          area,
        );
        return;
      }
    };

    let auto = if device.auto_update.enabled {
      let last_run = device
        .auto_update
        .last_run_utc
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
      format!(
        "every {}m (last run {})",
        device.auto_update.interval_minutes, last_run
      )
    } else {
      "off".to_string()
    };

    let lines = vec![
      Line::from(vec![
        Span::styled("Address: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}:{} {}", device.host, device.port, device.protocol)),
        Span::raw("  "),
        Span::styled("Auto-update: ", Style::default().fg(Color::DarkGray)),
        Span::raw(auto),
      ]),
      Line::from(vec![
        Span::styled("Cache: ", Style::default().fg(Color::DarkGray)),
        if device.cached_dirty {
          Span::styled("edits not yet pushed", Style::default().fg(Color::Yellow))
        } else {
          Span::styled("in sync with device", Style::default().fg(Color::Green))
        },
      ]),
    ];

    frame.render_widget(Paragraph::new(lines), area);
  }

  fn render_products(&mut self, frame: &mut Frame, area: Rect) {
    let today = Utc::now().date_naive();
    let filtered: Vec<Product> = self.filtered_products().into_iter().cloned().collect();
    ensure_valid_selection(&mut self.list_state, filtered.len());

    let title = match self.products.state() {
      QueryState::Loading => " Cached products (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Cached products (error: {}) ", e),
      _ if !self.filter.query().is_empty() => format!(
        " Cached products ({}/{}) [/{}] ",
        filtered.len(),
        self.products().len(),
        self.filter.query()
      ),
      _ => format!(" Cached products ({}) ", self.products().len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if filtered.is_empty() && !self.products.is_loading() {
      let content = if self.products.is_error() {
        "Failed to load products. Press 'r' to retry."
      } else if self.products().is_empty() {
        "Cache is empty. Press 'f' to fetch the device's catalog."
      } else {
        "No products match the filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Column headings
        Constraint::Min(0),    // Rows
      ])
      .split(inner);

    let headings = Line::from(Span::styled(
      format!(
        "  {:<7} {:<28} {:>8} {:>6} {:<10} {:<10} {}",
        "PLU", "NAME", "PRICE", "SHELF", "MADE", "SELL BY", "STATUS"
      ),
      Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(headings), chunks[0]);

    let items: Vec<ListItem> = filtered.iter().map(|product| {
      let status = product.expiry_status(today);
      let shelf = product
        .shelf_life_days
        .map(|days| format!("{}d", days))
        .unwrap_or_default();

      let line = Line::from(vec![
        Span::styled(
          format!("{:<7}", product.plu),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(" {:<28}", truncate(&product.name, 28))),
        Span::raw(format!(" {:>8}", format_price(product.price))),
        Span::raw(format!(" {:>6}", shelf)),
        Span::raw(format!(" {:<10}", product.manufacture_date)),
        Span::raw(format!(" {:<10}", product.sell_by_date)),
        Span::styled(status.label(), Style::default().fg(expiry_color(status))),
      ]);
      ListItem::new(line)
    }).collect();

    let list = List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ")
      // Keep unselected rows aligned with the column headings
      .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
  }
}

impl View for DeviceDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Let the filter overlay try first
    match self.filter.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(FilterEvent::Changed(_)) => return ViewAction::None,
      KeyResult::Event(FilterEvent::Submitted) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('r') => {
        self.device.refetch();
        self.products.refetch();
      }
      KeyCode::Char('f') => return self.start_fetch_products(),
      KeyCode::Char('u') => return self.start_push(),
      KeyCode::Char('a') => {
        return ViewAction::Push(Box::new(AutoUpdateView::new(
          self.device_id,
          self.client.clone(),
        )));
      }
      KeyCode::Char('E') => {
        if let Some(device) = self.device.data() {
          return ViewAction::Push(Box::new(DeviceFormView::edit(self.client.clone(), device)));
        }
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(product) = self.selected_product() {
          return ViewAction::Push(Box::new(ProductEditView::new(
            self.device_id,
            product,
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
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Device header
        Constraint::Min(1),    // Product table
      ])
      .split(area);

    self.render_header(frame, chunks[0]);
    self.render_products(frame, chunks[1]);
    self.filter.render_overlay(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    self.device_name.clone()
  }

  fn tick(&mut self) -> Vec<ViewAction> {
    self.device.poll();
    self.products.poll();

    let mut actions = Vec::new();
    match self.fetch_op.poll() {
      Some(Ok(message)) => actions.push(ViewAction::success(message)),
      Some(Err(message)) => actions.push(ViewAction::error(message)),
      None => {}
    }
    match self.push_op.poll() {
      Some(Ok(message)) => actions.push(ViewAction::success(message)),
      Some(Err(message)) => actions.push(ViewAction::error(message)),
      None => {}
    }
    actions
  }

  fn captures_input(&self) -> bool {
    self.filter.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("f", "fetch catalog").with_priority(10),
      ShortcutInfo::new("u", "push to device").with_priority(20),
      ShortcutInfo::new("e", "edit product").with_priority(30),
      ShortcutInfo::new("a", "auto-update").with_priority(40),
      ShortcutInfo::new("/", "filter").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(60),
    ]
  }
}
