//! `kohort`: command-line front end for the maternal-cohort registry.
//!
//! # Usage
//!
//! ```text
//! kohort --spreadsheet-id 1AbC... --access-token ya29... setup
//! kohort identity add < mother.json
//! kohort encounter add --mother TRX123456abc encounter.json
//! kohort encounter delete TRX123456abc
//! kohort --backend sqlite --account-email bidan@example.org mothers
//! ```
//!
//! Records are read as JSON (from a file argument, or stdin) and every result
//! is printed as JSON.

mod commands;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use kohort_core::relation::Account;
use kohort_registry::Registry;
use kohort_sheets::{SheetsClient, SheetsConfig};
use kohort_store_sqlite::SqliteSheetStore;

use commands::Command;
use settings::{Backend, Overrides, Settings};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kohort", version, about = "Maternal-cohort registry over a spreadsheet")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "kohort.toml")]
  config: PathBuf,

  /// Storage backend.
  #[arg(long, value_enum)]
  backend: Option<Backend>,

  /// Id of the hosted spreadsheet.
  #[arg(long)]
  spreadsheet_id: Option<String>,

  /// OAuth bearer token for the hosted spreadsheet.
  #[arg(long, env = "KOHORT_ACCESS_TOKEN", hide_env_values = true)]
  access_token: Option<String>,

  /// Act as this account instead of asking the userinfo endpoint.
  #[arg(long)]
  account_email: Option<String>,

  /// SQLite file for the local backend.
  #[arg(long, value_name = "FILE")]
  sqlite_path: Option<String>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = settings::load(&args.config, Overrides {
    backend:        args.backend,
    spreadsheet_id: args.spreadsheet_id,
    access_token:   args.access_token,
    account_email:  args.account_email,
    sqlite_path:    args.sqlite_path,
  })?;

  match settings.backend {
    Backend::Sheets => run_sheets(&settings, args.command)
      .await
      .map_err(explain_auth_failure),
    Backend::Sqlite => {
      let store = SqliteSheetStore::open(&settings.sqlite_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", settings.sqlite_path))?;
      let account = settings.account_email.as_deref().map(Account::new);
      commands::run(&Registry::new(store), account, args.command).await
    }
  }
}

async fn run_sheets(settings: &Settings, command: Command) -> Result<()> {
  let client = sheets_client(settings)?;
  let account = match &settings.account_email {
    Some(email) => Some(Account::new(email)),
    None if command.needs_account() => Some(Account::new(
      client
        .account_email()
        .await
        .context("failed to look up the signed-in account")?,
    )),
    None => None,
  };
  commands::run(&Registry::new(client), account, command).await
}

/// Point at the token when the hosted service refused it, wherever in the
/// chain the refusal sits.
fn explain_auth_failure(err: anyhow::Error) -> anyhow::Error {
  let rejected = err
    .chain()
    .filter_map(|cause| cause.downcast_ref::<kohort_sheets::Error>())
    .any(kohort_sheets::Error::is_auth_failure);
  if rejected {
    err.context("access token missing or rejected; set KOHORT_ACCESS_TOKEN or access_token")
  } else {
    err
  }
}

fn sheets_client(settings: &Settings) -> Result<SheetsClient> {
  let spreadsheet_id = settings
    .spreadsheet_id
    .clone()
    .context("spreadsheet_id is not configured")?;
  let config = SheetsConfig {
    api_base: settings.api_base.clone(),
    spreadsheet_id,
    access_token: settings.access_token.clone(),
    userinfo_url: settings.userinfo_url.clone(),
    timeout: Duration::from_secs(settings.timeout_secs),
  };
  Ok(SheetsClient::new(config)?)
}
