mod app;
mod cache;
mod commands;
mod config;
mod event;
mod github;
mod queries;
mod query;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use config::{Config, ListMode};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gh9s")]
#[command(about = "A terminal UI for GitHub issues, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./gh9s.yaml or $XDG_CONFIG_HOME/gh9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Repository to browse, as owner/name
  #[arg(short, long)]
  repo: Option<String>,

  /// How the issue list is walked through
  #[arg(short, long, value_enum)]
  mode: Option<ListMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let config = load_config(&args)?;
  info!(repo = %config.repo_slug(), mode = ?config.list_mode, "starting gh9s");

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}

/// Config file first, with command line flags layered on top. A `--repo` is
/// enough to run when no config file exists.
fn load_config(args: &Args) -> Result<Config> {
  let mut config = match (&args.config, &args.repo) {
    (Some(path), _) => Config::load(Some(path.as_path()))?,
    (None, Some(repo)) => Config::load_for_repo(repo)?,
    (None, None) => Config::load(None)?,
  };

  if let Some(repo) = &args.repo {
    let (owner, name) = config::parse_repo(repo)?;
    config.github.owner = owner;
    config.github.repo = name;
  }
  if let Some(mode) = args.mode {
    config.list_mode = mode;
  }

  Ok(config)
}

/// The terminal belongs to the UI, so logs go to a daily file under
/// `$XDG_DATA_HOME/gh9s/logs`. `GH9S_LOG` takes an `EnvFilter` directive.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("gh9s")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&log_dir, "gh9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("GH9S_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true)
    .init();

  Ok(guard)
}
