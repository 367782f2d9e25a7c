//! Relational bookkeeping over the registry spreadsheet.
//!
//! [`Registry`] wraps any [`SheetStore`] and provides what the flat tabs
//! lack: user resolution, synthetic foreign keys between rows, per-user
//! visibility, duplicate suppression and multi-tab deletion. Every operation
//! is a sequence of whole-range reads followed by appends or clears; there is
//! no locking and no rollback.
//!
//! | Module | Operations |
//! |--------|------------|
//! | [`relation`] | user resolution, relation minting, sessions |
//! | [`repo`] | owned reads and appends for any record type |
//! | [`saga`] | encounter and ANC deletion |
//! | [`intake`] | identity, encounter and ANC saves |

#![allow(async_fn_in_trait)]

pub mod error;
pub mod index;
pub mod intake;
pub mod relation;
pub mod repo;
pub mod saga;
pub mod session;

use strum::IntoEnumIterator as _;
use tracing::info;

use kohort_core::{range::A1Range, sheet::SheetStore, tab::Tab};

pub use error::{Error, ErrorKind, Result};
pub use intake::{Encounter, EncounterTarget, EncounterView, Mother, SavedEncounter};
pub use saga::{DeleteReport, SkipReason, StepOutcome, StepReport};
pub use session::{Session, SessionSummary};

/// The registry service over one spreadsheet.
pub struct Registry<S> {
  store: S,
}

impl<S: SheetStore> Registry<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Create every missing tab and give it its header row. Returns the tabs
  /// that were created; existing tabs are left untouched.
  pub async fn ensure_tabs(&self) -> Result<Vec<Tab>> {
    let existing = self.store.tab_titles().await.map_err(Error::store)?;
    let mut created = Vec::new();
    for tab in Tab::iter() {
      if existing.iter().any(|t| t == tab.title()) {
        continue;
      }
      self.store.create_tab(tab.title()).await.map_err(Error::store)?;
      let header = tab.header().into_iter().map(String::from).collect();
      self
        .store
        .write(A1Range::row(tab.title(), 1, tab.width(), 1), vec![header])
        .await
        .map_err(Error::store)?;
      info!(tab = tab.title(), "created tab");
      created.push(tab);
    }
    Ok(created)
  }
}
