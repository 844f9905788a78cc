mod app;
mod cache;
mod commands;
mod config;
mod dates;
mod event;
mod query;
mod scale;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s9s")]
#[command(about = "A terminal UI for smart scale fleets, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/s9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Scale server base URL (overrides the config file)
  #[arg(short, long)]
  server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // A TUI owns the terminal, so logs go to a file; enabled via S9S_LOG
  // (an EnvFilter directive, e.g. "info" or "s9s=debug").
  let _log_guard = init_tracing()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override server URL if specified on command line
  if let Some(server) = args.server {
    config.server.url = server;
  }

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}

fn init_tracing() -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
  let filter = match std::env::var("S9S_LOG") {
    Ok(filter) => filter,
    Err(_) => return Ok(None),
  };

  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("s9s");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let appender = tracing_appender::rolling::never(log_dir, "s9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(Some(guard))
}
