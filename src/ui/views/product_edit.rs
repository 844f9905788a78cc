use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::dates;
use crate::query::MutationOp;
use crate::scale::types::{Product, ProductPatch};
use crate::scale::CachedScaleClient;
use crate::ui::components::{Form, FormEvent, FormField, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

const PRICE: usize = 0;
const SHELF_LIFE: usize = 1;
const MANUFACTURE: usize = 2;
const SELL_BY: usize = 3;

/// Edit one cached product. Date fields are masked on every keystroke
/// and validated on blur/submit; the PATCH sends only changed fields.
pub struct ProductEditView {
  device_id: u64,
  product: Product,
  client: CachedScaleClient,
  form: Form,
  op: MutationOp<String>,
}

impl ProductEditView {
  pub fn new(device_id: u64, product: Product, client: CachedScaleClient) -> Self {
    let form = Form::new(vec![
      FormField::new("price")
        .with_value(format!("{}", product.price))
        .validated(validate_price),
      FormField::new("shelf life (days)")
        .with_value(
          product
            .shelf_life_days
            .map(|days| days.to_string())
            .unwrap_or_default(),
        )
        .validated(validate_shelf_life),
      FormField::new("manufactured (DD-MM-YY)")
        .with_value(product.manufacture_date.clone())
        .masked(dates::mask)
        .validated(dates::validate),
      FormField::new("sell by (DD-MM-YY)")
        .with_value(product.sell_by_date.clone())
        .masked(dates::mask)
        .validated(dates::validate),
    ]);

    Self {
      device_id,
      product,
      client,
      form,
      op: MutationOp::idle(),
    }
  }

  /// Build a patch containing only the fields that differ from the
  /// original product.
  fn build_patch(&self) -> ProductPatch {
    let mut patch = ProductPatch::default();

    if let Ok(price) = self.form.value(PRICE).trim().parse::<f64>() {
      if price != self.product.price {
        patch.price = Some(price);
      }
    }

    let shelf = self.form.value(SHELF_LIFE).trim();
    let shelf = if shelf.is_empty() {
      None
    } else {
      shelf.parse::<u32>().ok()
    };
    if shelf != self.product.shelf_life_days {
      if let Some(days) = shelf {
        patch.shelf_life_days = Some(days);
      }
    }

    let manufacture = self.form.value(MANUFACTURE);
    if manufacture != self.product.manufacture_date {
      patch.manufacture_date = Some(manufacture.to_string());
    }

    let sell_by = self.form.value(SELL_BY);
    if sell_by != self.product.sell_by_date {
      patch.sell_by_date = Some(sell_by.to_string());
    }

    patch
  }

  fn submit(&mut self) -> Option<ViewAction> {
    let patch = self.build_patch();
    if patch.is_empty() {
      return Some(ViewAction::info("No changes to save"));
    }

    let client = self.client.clone();
    let device_id = self.device_id;
    let plu = self.product.plu;
    self.op.start(async move {
      client
        .patch_product(device_id, plu, &patch)
        .await
        .map_err(|e| e.to_string())?;
      Ok(format!("Product {} updated", plu))
    });
    None
  }
}

impl View for ProductEditView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        if self.op.in_flight() {
          return ViewAction::None;
        }
        self.submit().unwrap_or(ViewAction::None)
      }
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.op.in_flight() {
      format!(" {} · PLU {} (saving...) ", self.product.name, self.product.plu)
    } else {
      format!(" {} · PLU {} ", self.product.name, self.product.plu)
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
      .constraints([Constraint::Length(5), Constraint::Min(0)])
      .split(inner);

    self.form.render(frame, chunks[0]);

    frame.render_widget(
      Paragraph::new(" Enter: save changed fields   Esc: cancel   Tab: next field")
        .style(Style::default().fg(Color::DarkGray)),
      chunks[1],
    );
  }

  fn breadcrumb_label(&self) -> String {
    format!("PLU {}", self.product.plu)
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

fn validate_price(value: &str) -> Option<String> {
  match value.trim().parse::<f64>() {
    Ok(price) if price.is_finite() && price >= 0.0 => None,
    _ => Some("Invalid price".to_string()),
  }
}

fn validate_shelf_life(value: &str) -> Option<String> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }
  match value.parse::<u32>() {
    Ok(_) => None,
    Err(_) => Some("Shelf life must be a whole number of days".to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_price() {
    assert!(validate_price("1.99").is_none());
    assert!(validate_price("0").is_none());
    assert!(validate_price("-1").is_some());
    assert!(validate_price("abc").is_some());
  }

  #[test]
  fn test_validate_shelf_life() {
    assert!(validate_shelf_life("").is_none());
    assert!(validate_shelf_life("7").is_none());
    assert!(validate_shelf_life("7.5").is_some());
    assert!(validate_shelf_life("-1").is_some());
  }
}
