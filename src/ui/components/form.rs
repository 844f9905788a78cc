use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::input::{InputResult, TextInput};
use super::KeyResult;

/// Transform applied to a field's value after every keystroke (e.g.
/// date masking).
type MaskFn = fn(&str) -> String;

/// Validator returning an inline error message, run on blur and on
/// submit.
type ValidatorFn = fn(&str) -> Option<String>;

/// Events emitted by a form that the parent needs to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
  /// Enter pressed and every field validated
  Submitted,
  /// Escape pressed
  Cancelled,
}

/// A labelled input with optional masking and validation.
pub struct FormField {
  label: &'static str,
  input: TextInput,
  mask: Option<MaskFn>,
  validator: Option<ValidatorFn>,
  error: Option<String>,
  secret: bool,
}

impl FormField {
  pub fn new(label: &'static str) -> Self {
    Self {
      label,
      input: TextInput::new(),
      mask: None,
      validator: None,
      error: None,
      secret: false,
    }
  }

  /// Prefill the field (the mask, if any, is applied to the value).
  pub fn with_value(mut self, value: impl Into<String>) -> Self {
    self.input = TextInput::with_value(value);
    self.apply_mask();
    self
  }

  /// Apply a mask transform on every keystroke.
  pub fn masked(mut self, mask: MaskFn) -> Self {
    self.mask = Some(mask);
    self.apply_mask();
    self
  }

  /// Validate on blur and on submit.
  pub fn validated(mut self, validator: ValidatorFn) -> Self {
    self.validator = Some(validator);
    self
  }

  /// Render the value as dots (passwords).
  pub fn secret(mut self) -> Self {
    self.secret = true;
    self
  }

  pub fn value(&self) -> &str {
    self.input.value()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Set an error from outside the field's own validator (cross-field
  /// rules like password confirmation).
  pub fn set_error(&mut self, error: Option<String>) {
    self.error = error;
  }

  fn apply_mask(&mut self) {
    if let Some(mask) = self.mask {
      let masked = mask(self.input.value());
      if masked != self.input.value() {
        self.input.set_value(masked);
      }
    }
  }

  fn run_validator(&mut self) -> bool {
    self.error = self.validator.and_then(|validate| validate(self.input.value()));
    self.error.is_none()
  }
}

/// A vertical stack of fields with focus cycling and submit-time
/// validation.
pub struct Form {
  fields: Vec<FormField>,
  focused: usize,
}

impl Form {
  pub fn new(fields: Vec<FormField>) -> Self {
    Self { fields, focused: 0 }
  }

  pub fn value(&self, index: usize) -> &str {
    self.fields[index].value()
  }

  pub fn field_mut(&mut self, index: usize) -> &mut FormField {
    &mut self.fields[index]
  }

  /// Validate every field; focus moves to the first invalid one.
  pub fn validate_all(&mut self) -> bool {
    let mut first_invalid = None;
    for (index, field) in self.fields.iter_mut().enumerate() {
      field.apply_mask();
      if !field.run_validator() && first_invalid.is_none() {
        first_invalid = Some(index);
      }
    }
    if let Some(index) = first_invalid {
      self.focused = index;
      return false;
    }
    true
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Enter => {
        return if self.validate_all() {
          KeyResult::Event(FormEvent::Submitted)
        } else {
          KeyResult::Handled
        };
      }
      KeyCode::Tab | KeyCode::Down => {
        self.blur();
        self.focused = (self.focused + 1) % self.fields.len();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.blur();
        self.focused = if self.focused == 0 {
          self.fields.len() - 1
        } else {
          self.focused - 1
        };
        return KeyResult::Handled;
      }
      _ => {}
    }

    let field = &mut self.fields[self.focused];
    match field.input.handle_key(key) {
      InputResult::Consumed => {
        // Mask on every keystroke; a fresh edit clears the stale error.
        field.apply_mask();
        field.error = None;
        KeyResult::Handled
      }
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Leaving a field re-applies the mask and validates it.
  fn blur(&mut self) {
    let field = &mut self.fields[self.focused];
    field.apply_mask();
    field.run_validator();
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let label_width = self
      .fields
      .iter()
      .map(|f| f.label.len())
      .max()
      .unwrap_or(0);

    for (index, field) in self.fields.iter().enumerate() {
      if index as u16 >= area.height {
        break;
      }
      let row = Rect::new(area.x, area.y + index as u16, area.width, 1);
      let focused = index == self.focused;

      let shown = if field.secret {
        "•".repeat(field.value().chars().count())
      } else {
        field.value().to_string()
      };

      let mut spans = vec![
        Span::styled(
          format!(" {:>width$}: ", field.label, width = label_width),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          shown,
          if focused {
            Style::default().fg(Color::White).bold()
          } else {
            Style::default().fg(Color::Gray)
          },
        ),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      if let Some(error) = field.error() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error, Style::default().fg(Color::Red)));
      }

      frame.render_widget(Paragraph::new(Line::from(spans)), row);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dates;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut Form, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn date_form() -> Form {
    Form::new(vec![FormField::new("sell by")
      .masked(dates::mask)
      .validated(dates::validate)])
  }

  #[test]
  fn test_date_field_masks_on_every_keystroke() {
    let mut form = date_form();

    type_str(&mut form, "01");
    assert_eq!(form.value(0), "01");
    type_str(&mut form, "0");
    assert_eq!(form.value(0), "01-0");
    type_str(&mut form, "1260");
    assert_eq!(form.value(0), "01-01-26");
  }

  #[test]
  fn test_submit_blocked_by_invalid_field() {
    let mut form = date_form();
    type_str(&mut form, "310226");

    // 31-02-26 matches the pattern but names no real date.
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(form.fields[0].error().is_some());
  }

  #[test]
  fn test_submit_with_valid_fields() {
    let mut form = date_form();
    type_str(&mut form, "010126");

    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted)
    );
  }

  #[test]
  fn test_empty_date_is_valid() {
    let mut form = date_form();
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted)
    );
  }

  #[test]
  fn test_blur_validates_and_edit_clears_error() {
    let mut form = Form::new(vec![
      FormField::new("date").masked(dates::mask).validated(dates::validate),
      FormField::new("other"),
    ]);

    type_str(&mut form, "1");
    form.handle_key(key(KeyCode::Tab));
    assert!(form.fields[0].error().is_some());

    form.handle_key(key(KeyCode::BackTab));
    type_str(&mut form, "1");
    assert!(form.fields[0].error().is_none());
  }

  #[test]
  fn test_prefilled_value_is_masked() {
    let form = Form::new(vec![FormField::new("date")
      .with_value("010126")
      .masked(dates::mask)]);
    assert_eq!(form.value(0), "01-01-26");
  }
}
