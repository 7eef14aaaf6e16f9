use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::range::RangePreset;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// List endpoint to browse (defaults to "items")
  #[serde(default = "default_resource")]
  pub resource: String,
  /// Range used when none is given on the command line
  #[serde(default)]
  pub default_range: RangePreset,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL, e.g. https://mangosteen.example.com/api/v1
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is unset
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_resource() -> String {
  "items".to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tally.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tally/config.yaml
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tally/config.yaml \
         with at least `api: {{ url: ... }}`."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("tally.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tally").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Parse configuration from YAML text
  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.resource.trim().is_empty() || config.resource.contains('/') {
      return Err(eyre!("resource must be a single path segment, got {:?}", config.resource));
    }
    Ok(config)
  }

  /// Get the API token from environment variables.
  ///
  /// Checks TALLY_API_TOKEN first, then MANGOSTEEN_TOKEN as fallback.
  /// Requests go out unauthenticated when neither is set.
  pub fn get_api_token() -> Option<String> {
    std::env::var("TALLY_API_TOKEN")
      .or_else(|_| std::env::var("MANGOSTEEN_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}
