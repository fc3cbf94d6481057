use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "ACCTDASH_API_URL";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Custom title for the header
  pub title: Option<String>,
  pub api: ApiConfig,
  pub dashboard: DashboardConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000/api".to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
  /// Rows per page in the payments and invoices tables
  pub page_size: u32,
  pub summary_refresh_secs: u64,
  pub logs_refresh_secs: u64,
  /// Number of activity log entries shown
  pub logs_limit: u32,
  /// Event loop tick, which also bounds how quickly settled fetches appear
  pub tick_rate_ms: u64,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      page_size: 10,
      summary_refresh_secs: 10,
      logs_refresh_secs: 5,
      logs_limit: 20,
      tick_rate_ms: 250,
    }
  }
}

impl DashboardConfig {
  pub fn summary_refresh(&self) -> Duration {
    Duration::from_secs(self.summary_refresh_secs)
  }

  pub fn logs_refresh(&self) -> Duration {
    Duration::from_secs(self.logs_refresh_secs)
  }

  pub fn tick_rate(&self) -> Duration {
    Duration::from_millis(self.tick_rate_ms)
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter when `RUST_LOG` is unset
  pub level: String,
  /// Log directory (defaults to the platform data directory)
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./acctdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/acctdash/config.yaml
  ///
  /// Without a file the defaults apply. `ACCTDASH_API_URL` overrides the
  /// API base URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      config.api.base_url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("acctdash.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("acctdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to unit, not to an empty mapping
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Reject values the dashboard cannot run with.
  pub fn validate(&self) -> Result<()> {
    url::Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;

    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be greater than zero"));
    }
    let dashboard = &self.dashboard;
    if dashboard.page_size == 0 {
      return Err(eyre!("dashboard.page_size must be greater than zero"));
    }
    if dashboard.summary_refresh_secs == 0 || dashboard.logs_refresh_secs == 0 {
      return Err(eyre!("refresh intervals must be greater than zero"));
    }
    if dashboard.tick_rate_ms == 0 {
      return Err(eyre!("dashboard.tick_rate_ms must be greater than zero"));
    }
    Ok(())
  }

  /// Header title, falling back to the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.api.base_url)
      .ok()
      .and_then(|u| u.host_str().map(|h| format!("acctdash @ {}", h)))
      .unwrap_or_else(|| "acctdash".to_string())
  }
}
