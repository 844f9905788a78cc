mod command_input;
mod filter_bar;
mod form;
mod input;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_bar::{FilterBar, FilterEvent};
pub use form::{Form, FormEvent, FormField};
pub use input::{InputResult, TextInput};
pub use toast::{Toast, ToastLevel, Toasts};

/// Result of offering a key event to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<E> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(E),
  /// Key was not handled, pass to the next handler
  NotHandled,
}
