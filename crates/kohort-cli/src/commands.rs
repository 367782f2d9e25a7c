//! Subcommands and their dispatch over any backend.

use std::{
  io::Read as _,
  path::{Path, PathBuf},
};

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use kohort_core::{
  ident::TransactionId,
  record::{AncVisit, IdentityRecord},
  relation::Account,
  sheet::SheetStore,
  tab::Tab,
};
use kohort_registry::{Encounter, EncounterTarget, Registry, Session};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create any missing tabs and their header rows.
  Setup,
  #[command(flatten)]
  Session(SessionCommand),
}

/// Commands that act as the signed-in account.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
  /// Show the acting account, its user id and relation count.
  Whoami,
  /// Mother identities.
  #[command(subcommand)]
  Identity(IdentityCommand),
  /// Recorded mothers with the transaction ids ANC visits attach to.
  Mothers,
  /// Exam, lab, delivery and postpartum entries.
  #[command(subcommand)]
  Encounter(EncounterCommand),
  /// Antenatal-care visits.
  #[command(subcommand)]
  Anc(AncCommand),
  /// Raw rows of one tab that belong to the acting user.
  Rows {
    /// Tab title (`Relasi`) or name (`relation`).
    #[arg(value_parser = parse_tab)]
    tab: Tab,
  },
}

#[derive(Args, Debug)]
pub struct Input {
  /// JSON file to read; stdin when omitted or `-`.
  #[arg(value_name = "FILE")]
  input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum IdentityCommand {
  /// Save a new identity, rejecting duplicates.
  Add(Input),
  List,
}

#[derive(Subcommand, Debug)]
pub enum EncounterCommand {
  /// Save the four encounter sections under one transaction id.
  Add {
    /// Attach to this mother's transaction id instead of minting a new one.
    #[arg(long, value_name = "ID_TRX")]
    mother: Option<String>,
    #[command(flatten)]
    input:  Input,
  },
  List,
  /// Clear every row of the encounter and its relation.
  Delete { id_trx: String },
}

#[derive(Subcommand, Debug)]
pub enum AncCommand {
  Add {
    /// Transaction id of a recorded mother (see `kohort mothers`).
    #[arg(long, value_name = "ID_TRX")]
    mother: String,
    #[command(flatten)]
    input:  Input,
  },
  List,
  /// Clear the first visit whose leading id matches.
  Delete { id_trx: String },
}

impl Command {
  pub fn needs_account(&self) -> bool { matches!(self, Command::Session(_)) }
}

fn parse_tab(value: &str) -> Result<Tab, String> {
  value
    .parse::<Tab>()
    .or_else(|_| serde_json::from_value(serde_json::Value::String(value.to_string())))
    .map_err(|_| format!("unknown tab {value:?}"))
}

fn read_json<T: DeserializeOwned>(input: &Input) -> Result<T> {
  let raw = match input.input.as_deref() {
    Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
      .with_context(|| format!("reading {}", path.display()))?,
    _ => {
      let mut raw = String::new();
      std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading stdin")?;
      raw
    }
  };
  serde_json::from_str(&raw).context("parsing input JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

async fn open<S: SheetStore>(registry: &Registry<S>, account: Option<&Account>) -> Result<Session> {
  registry.ensure_tabs().await?;
  Ok(registry.open_session(account).await?)
}

pub async fn run<S: SheetStore>(
  registry: &Registry<S>,
  account: Option<Account>,
  command: Command,
) -> Result<()> {
  match command {
    Command::Setup => print_json(&registry.ensure_tabs().await?),
    Command::Session(command) => run_session(registry, account, command).await,
  }
}

async fn run_session<S: SheetStore>(
  registry: &Registry<S>,
  account: Option<Account>,
  command: SessionCommand,
) -> Result<()> {
  let mut session = open(registry, account.as_ref()).await?;
  match command {
    SessionCommand::Whoami => print_json(&session.summary()),
    SessionCommand::Identity(IdentityCommand::Add(input)) => {
      let record: IdentityRecord = read_json(&input)?;
      print_json(&registry.save_identity(&mut session, record).await?)
    }
    SessionCommand::Identity(IdentityCommand::List) => {
      print_json(&registry.read_owned::<IdentityRecord>(&session).await?)
    }
    SessionCommand::Mothers => print_json(&registry.list_mothers(&session).await?),
    SessionCommand::Encounter(EncounterCommand::Add { mother, input }) => {
      let encounter: Encounter = read_json(&input)?;
      let target = match mother {
        Some(id_trx) => EncounterTarget::Mother(TransactionId::new(id_trx)),
        None => EncounterTarget::New,
      };
      print_json(&registry.save_encounter(&mut session, target, &encounter).await?)
    }
    SessionCommand::Encounter(EncounterCommand::List) => {
      print_json(&registry.list_encounters(&session).await?)
    }
    SessionCommand::Encounter(EncounterCommand::Delete { id_trx }) => {
      let report = registry
        .delete_by_transaction(&mut session, &TransactionId::new(id_trx))
        .await?;
      print_json(&report)?;
      if !report.is_complete() {
        let failed: Vec<_> = report.failed().map(|s| s.tab.title()).collect();
        warn!(?failed, "delete incomplete; run it again to finish");
        bail!("delete of {} incomplete: {} failed", report.id_trx, failed.join(", "));
      }
      Ok(())
    }
    SessionCommand::Anc(AncCommand::Add { mother, input }) => {
      let visit: AncVisit = read_json(&input)?;
      let saved = registry
        .save_anc_visit(&session, &TransactionId::new(mother), &visit)
        .await?;
      print_json(&saved)
    }
    SessionCommand::Anc(AncCommand::List) => {
      print_json(&registry.read_owned::<AncVisit>(&session).await?)
    }
    SessionCommand::Anc(AncCommand::Delete { id_trx }) => {
      let row = registry
        .delete_anc_by_transaction(&session, &TransactionId::new(id_trx))
        .await?;
      print_json(&serde_json::json!({ "cleared_row": row }))
    }
    SessionCommand::Rows { tab } => print_json(&registry.owned_rows(&session, tab).await?),
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser as _;

  use super::*;

  #[derive(clap::Parser, Debug)]
  struct TestCli {
    #[command(subcommand)]
    command: Command,
  }

  #[test]
  fn tabs_parse_by_title_or_name() {
    assert_eq!(parse_tab("Relasi"), Ok(Tab::Relation));
    assert_eq!(parse_tab("postpartum"), Ok(Tab::Postpartum));
    assert!(parse_tab("Sheet1").is_err());
  }

  #[test]
  fn encounter_add_accepts_a_mother() {
    let args = ["kohort", "encounter", "add", "--mother", "TRX1", "e.json"];
    match TestCli::try_parse_from(args).unwrap().command {
      Command::Session(SessionCommand::Encounter(EncounterCommand::Add { mother, input })) => {
        assert_eq!(mother.as_deref(), Some("TRX1"));
        assert_eq!(input.input, Some(PathBuf::from("e.json")));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn anc_add_requires_a_mother() {
    assert!(TestCli::try_parse_from(["kohort", "anc", "add"]).is_err());
  }

  #[test]
  fn only_setup_runs_without_an_account() {
    let setup = TestCli::try_parse_from(["kohort", "setup"]).unwrap().command;
    assert!(matches!(setup, Command::Setup));
    assert!(!setup.needs_account());

    let mothers = TestCli::try_parse_from(["kohort", "mothers"]).unwrap().command;
    assert!(matches!(mothers, Command::Session(SessionCommand::Mothers)));
    assert!(mothers.needs_account());
  }

  #[tokio::test]
  async fn setup_and_whoami_against_a_local_grid() {
    let store = kohort_store_sqlite::SqliteSheetStore::open_in_memory()
      .await
      .unwrap();
    let registry = Registry::new(store);

    run(&registry, None, Command::Setup).await.unwrap();
    assert_eq!(registry.store().tab_titles().await.unwrap().len(), 8);

    let whoami = Command::Session(SessionCommand::Whoami);
    run(&registry, Some(Account::new("bidan@example.org")), whoami)
      .await
      .unwrap();

    let mothers = Command::Session(SessionCommand::Mothers);
    let err = run(&registry, None, mothers).await.unwrap_err();
    assert!(err.to_string().contains("not signed in"));
  }
}
