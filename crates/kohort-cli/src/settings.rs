//! Layered configuration: defaults, then the TOML file, then `KOHORT_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::Deserialize;

use kohort_sheets::{DEFAULT_API_BASE, DEFAULT_USERINFO_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// The hosted spreadsheet.
  Sheets,
  /// A local SQLite grid with the same layout.
  Sqlite,
}

impl Backend {
  fn as_str(self) -> &'static str {
    match self {
      Backend::Sheets => "sheets",
      Backend::Sqlite => "sqlite",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub backend:        Backend,
  #[serde(default)]
  pub spreadsheet_id: Option<String>,
  pub api_base:       String,
  pub userinfo_url:   String,
  #[serde(default)]
  pub access_token:   Option<String>,
  /// Skips the userinfo lookup when set.
  #[serde(default)]
  pub account_email:  Option<String>,
  pub sqlite_path:    PathBuf,
  pub timeout_secs:   u64,
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Default)]
pub struct Overrides {
  pub backend:        Option<Backend>,
  pub spreadsheet_id: Option<String>,
  pub access_token:   Option<String>,
  pub account_email:  Option<String>,
  pub sqlite_path:    Option<String>,
}

pub fn load(file: &Path, overrides: Overrides) -> Result<Settings> {
  let settings = config::Config::builder()
    .set_default("backend", "sheets")?
    .set_default("api_base", DEFAULT_API_BASE)?
    .set_default("userinfo_url", DEFAULT_USERINFO_URL)?
    .set_default("sqlite_path", "kohort.db")?
    .set_default("timeout_secs", 30)?
    .add_source(config::File::from(file).required(false))
    .add_source(config::Environment::with_prefix("KOHORT"))
    .set_override_option("backend", overrides.backend.map(Backend::as_str))?
    .set_override_option("spreadsheet_id", overrides.spreadsheet_id)?
    .set_override_option("access_token", overrides.access_token)?
    .set_override_option("account_email", overrides.account_email)?
    .set_override_option("sqlite_path", overrides.sqlite_path)?
    .build()
    .with_context(|| format!("failed to read configuration from {}", file.display()))?;

  let mut settings: Settings = settings
    .try_deserialize()
    .context("failed to deserialise settings")?;
  settings.sqlite_path = expand_tilde(&settings.sqlite_path);
  Ok(settings)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
