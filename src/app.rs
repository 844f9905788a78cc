use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::scale::{CachedScaleClient, Session};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Toast, ToastLevel, Toasts};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{AuthView, DeviceDetailView, DevicesView};

/// Main application state: a stack of views plus the chrome around them
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,

  /// Command palette (`:`)
  command: CommandInput,

  /// Transient notifications
  toasts: Toasts,

  /// Application configuration
  config: Config,

  /// Cached scale client shared by all views
  client: CachedScaleClient,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let session = Session::new();
    let client = CachedScaleClient::new(&config, session)?;

    // There is no token persistence, so every run starts at the login
    // view.
    let root = AuthView::new(client.clone(), config.server.email.clone());

    Ok(Self {
      views: vec![Box::new(root)],
      command: CommandInput::new(),
      toasts: Toasts::new(),
      config,
      client,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {} // Redrawn on the next loop iteration
      Event::Tick => self.handle_tick(),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Command palette gets the key first (it also handles activation),
    // unless the view is capturing text and the palette is closed.
    let view_captures = self
      .views
      .last()
      .map(|v| v.captures_input())
      .unwrap_or(false);
    if self.command.is_active() || !view_captures {
      match self.command.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.views.last_mut() {
      let action = view.handle_key(key);
      self.apply_action(action);
    }
  }

  fn handle_tick(&mut self) {
    self.toasts.tick();

    // Only the visible view polls its queries and pending operations
    let actions = match self.views.last_mut() {
      Some(view) => view.tick(),
      None => Vec::new(),
    };
    for action in actions {
      self.apply_action(action);
    }

    // Unauthenticated transition: a 401 cleared the token somewhere.
    // Drop all cached query state and fall back to the login view.
    let needs_session = self.views.last().map(|v| v.requires_auth()).unwrap_or(false);
    if needs_session && !self.client.session().is_authenticated() {
      if let Err(e) = self.client.clear_cache() {
        warn!("failed to clear cache on session end: {}", e);
      }
      self.toasts.push(Toast::new(
        ToastLevel::Info,
        "Session expired, please log in again",
      ));
      self.reset_to_auth();
    }
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::ReplaceRoot(view) => {
        self.views = vec![view];
      }
      ViewAction::Toast(toast) => self.toasts.push(toast),
    }
  }

  fn execute_command(&mut self, input: &str) {
    let (command, argument) = commands::split_command(input);
    info!(command, "executing palette command");

    match command {
      "devices" => {
        if self.client.session().is_authenticated() {
          self.apply_action(ViewAction::ReplaceRoot(Box::new(DevicesView::new(
            self.client.clone(),
          ))));
        } else {
          self.toasts.push(Toast::new(ToastLevel::Error, "Log in first"));
        }
      }
      "device" => {
        // Palette input is text; the id must become a number before any
        // cache key is built from it.
        match argument.and_then(|arg| arg.parse::<u64>().ok()) {
          Some(device_id) if self.client.session().is_authenticated() => {
            self.apply_action(ViewAction::Push(Box::new(DeviceDetailView::new(
              device_id,
              format!("device {}", device_id),
              self.client.clone(),
            ))));
          }
          Some(_) => {
            self.toasts.push(Toast::new(ToastLevel::Error, "Log in first"));
          }
          None => {
            self
              .toasts
              .push(Toast::new(ToastLevel::Error, "Usage: device <id>"));
          }
        }
      }
      "logout" => {
        if let Err(e) = self.client.logout() {
          warn!("logout cleanup failed: {}", e);
        }
        self.toasts.push(Toast::new(ToastLevel::Info, "Logged out"));
        self.reset_to_auth();
      }
      "quit" => {
        self.should_quit = true;
      }
      "" => {}
      unknown => {
        self
          .toasts
          .push(Toast::new(ToastLevel::Error, format!("Unknown command: {}", unknown)));
      }
    }
  }

  fn reset_to_auth(&mut self) {
    self.views = vec![Box::new(AuthView::new(
      self.client.clone(),
      self.config.server.email.clone(),
    ))];
  }

  // Accessors for UI rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.views.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn toasts(&self) -> &Toasts {
    &self.toasts
  }

  pub fn server_url(&self) -> &str {
    self.client.base_url()
  }

  pub fn title(&self) -> Option<&str> {
    self.config.title.as_deref()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .views
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }
}
