//! File logging. The terminal belongs to the UI, so events go to a daily
//! rolling file instead of stderr.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

const LOG_FILE_PREFIX: &str = "acctdash.log";

/// Where log files are written
pub fn log_directory(config: &LogConfig) -> PathBuf {
  if let Some(dir) = &config.directory {
    return dir.clone();
  }
  dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("acctdash")
    .join("logs")
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes buffered lines on drop and must live until exit.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let directory = log_directory(config);
  std::fs::create_dir_all(&directory)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", directory.display(), e))?;

  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) => EnvFilter::try_new(&config.level)
      .map_err(|e| eyre!("Invalid log level '{}': {}", config.level, e))?,
  };

  let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_explicit_directory_wins() {
    let config = LogConfig {
      level: "debug".to_string(),
      directory: Some(PathBuf::from("/var/log/acctdash")),
    };
    assert_eq!(log_directory(&config), PathBuf::from("/var/log/acctdash"));
  }

  #[test]
  fn test_default_directory_is_namespaced() {
    let dir = log_directory(&LogConfig::default());
    assert!(dir.ends_with("acctdash/logs"));
  }
}
