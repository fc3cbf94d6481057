mod api;
mod app;
mod chat;
mod config;
mod dashboard;
mod event;
mod logging;
mod pagination;
mod query;
mod summary;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "acctdash")]
#[command(about = "A terminal dashboard for payments, invoices and an accounting assistant")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/acctdash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, e.g. http://localhost:8000/api
  #[arg(long)]
  api_url: Option<String>,

  /// Rows per page in the payments and invoices tables
  #[arg(long)]
  page_size: Option<u32>,

  /// Log filter when RUST_LOG is unset (e.g. debug, acctdash=trace)
  #[arg(long)]
  log_level: Option<String>,
}

impl Args {
  /// Apply command line overrides on top of the loaded configuration
  fn apply(self, mut config: config::Config) -> Result<config::Config> {
    if let Some(url) = self.api_url {
      config.api.base_url = url;
    }
    if let Some(page_size) = self.page_size {
      config.dashboard.page_size = page_size;
    }
    if let Some(level) = self.log_level {
      config.log.level = level;
    }
    config.validate()?;
    Ok(config)
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let config = args.apply(config)?;

  // Held until exit so buffered log lines are flushed
  let _log_guard = logging::init(&config.log)?;
  info!(api = %config.api.base_url, "starting acctdash");

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cli_overrides() {
    let args = Args::parse_from([
      "acctdash",
      "--api-url",
      "https://books.example.com/api",
      "--page-size",
      "25",
    ]);
    let config = args.apply(config::Config::default()).unwrap();
    assert_eq!(config.api.base_url, "https://books.example.com/api");
    assert_eq!(config.dashboard.page_size, 25);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_invalid_override_is_rejected() {
    let args = Args::parse_from(["acctdash", "--page-size", "0"]);
    assert!(args.apply(config::Config::default()).is_err());
  }
}
