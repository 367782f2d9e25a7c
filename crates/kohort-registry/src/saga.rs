//! Multi-tab deletion.
//!
//! Deleting an encounter touches five tabs with no transaction around them.
//! [`Registry::delete_by_transaction`] runs the clears as ordered steps and
//! records each step's outcome in a [`DeleteReport`]; nothing is rolled back.
//! The `Relasi` row is cleared last and only when every dependent step
//! succeeded, so a failed delete can be re-run to finish the job.

use serde::Serialize;
use tracing::{debug, info, warn};

use kohort_core::{
  ident::TransactionId,
  relation::Relation,
  sheet::{data_rows, SheetStore},
  tab::{Tab, ENCOUNTER_TABS},
};

use crate::{index::OwnerIndex, Error, ErrorKind, Registry, Result, Session};

/// Why a step did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// The transaction id is not (or no longer) owned by this user.
  NotOwned,
  /// An earlier step failed; the relation is kept so a re-run can finish.
  DependentStepFailed,
  /// The relation still owns an identity row and must outlive the encounter.
  OwnsIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  Completed { cleared: usize },
  Failed { kind: ErrorKind, error: String },
  Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
  pub tab:     Tab,
  pub outcome: StepOutcome,
}

/// The outcome of every step of one encounter delete, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
  pub id_trx: TransactionId,
  pub steps:  Vec<StepReport>,
}

impl DeleteReport {
  fn skipped(id_trx: TransactionId, reason: SkipReason) -> Self {
    let steps = ENCOUNTER_TABS
      .into_iter()
      .chain([Tab::Relation])
      .map(|tab| StepReport { tab, outcome: StepOutcome::Skipped { reason } })
      .collect();
    Self { id_trx, steps }
  }

  /// True when no step failed.
  pub fn is_complete(&self) -> bool { self.failed().next().is_none() }

  pub fn failed(&self) -> impl Iterator<Item = &StepReport> {
    self
      .steps
      .iter()
      .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
  }

  /// Rows cleared across all steps.
  pub fn cleared(&self) -> usize {
    self
      .steps
      .iter()
      .map(|s| match s.outcome {
        StepOutcome::Completed { cleared } => cleared,
        _ => 0,
      })
      .sum()
  }

  pub fn outcome(&self, tab: Tab) -> Option<&StepOutcome> {
    self.steps.iter().find(|s| s.tab == tab).map(|s| &s.outcome)
  }
}

fn failed(err: Error) -> StepOutcome {
  StepOutcome::Failed { kind: err.kind(), error: err.to_string() }
}

impl<S: SheetStore> Registry<S> {
  /// Clear every row of `tab` whose trailing cell is `id_trx`, bottom up.
  async fn clear_trailing(&self, tab: Tab, id_trx: &TransactionId) -> Result<usize> {
    let grid = self.store.read(tab.full_range()).await.map_err(Error::store)?;
    let index = OwnerIndex::trailing(&grid);
    let rows = index.rows(id_trx.as_str());
    for &row in rows.iter().rev() {
      self.store.clear(tab.row_range(row)).await.map_err(Error::store)?;
    }
    debug!(tab = tab.title(), %id_trx, cleared = rows.len(), "cleared rows");
    Ok(rows.len())
  }

  async fn relation_owns_identity(&self, relation: &Relation) -> Result<bool> {
    let grid = self
      .store
      .read(Tab::Identity.full_range())
      .await
      .map_err(Error::store)?;
    Ok(OwnerIndex::trailing(&grid).contains(relation.id.as_str()))
  }

  /// Clear the session user's `Relasi` rows carrying `id_trx`.
  async fn clear_relation(&self, session: &Session, id_trx: &TransactionId) -> Result<usize> {
    let grid = self
      .store
      .read(Tab::Relation.layout_range())
      .await
      .map_err(Error::store)?;
    let rows: Vec<u32> = data_rows(&grid)
      .filter_map(|(row, cells)| Relation::from_cells(cells).map(|r| (row, r)))
      .filter(|(_, r)| &r.id_trx == id_trx && &r.user_id == session.user_id())
      .map(|(row, _)| row)
      .collect();
    for &row in rows.iter().rev() {
      self
        .store
        .clear(Tab::Relation.row_range(row))
        .await
        .map_err(Error::store)?;
    }
    Ok(rows.len())
  }

  async fn relation_step(&self, session: &mut Session, id_trx: &TransactionId) -> StepOutcome {
    let Some(owner) = session.relation_by_trx(id_trx.as_str()) else {
      return StepOutcome::Skipped { reason: SkipReason::NotOwned };
    };
    match self.relation_owns_identity(&owner.relation).await {
      Ok(true) => return StepOutcome::Skipped { reason: SkipReason::OwnsIdentity },
      Ok(false) => {}
      Err(err) => return failed(err),
    }
    match self.clear_relation(session, id_trx).await {
      Ok(cleared) => {
        session.remove(id_trx);
        StepOutcome::Completed { cleared }
      }
      Err(err) => failed(err),
    }
  }

  /// Delete one encounter: its exam, lab, delivery and postpartum rows, then
  /// its `Relasi` row.
  ///
  /// A transaction id the session does not own (including one already
  /// deleted) yields a report with every step skipped and touches nothing.
  pub async fn delete_by_transaction(
    &self,
    session: &mut Session,
    id_trx: &TransactionId,
  ) -> Result<DeleteReport> {
    if !session.owns_transaction(id_trx.as_str()) {
      debug!(%id_trx, "delete of unowned transaction is a no-op");
      return Ok(DeleteReport::skipped(id_trx.clone(), SkipReason::NotOwned));
    }

    let mut steps = Vec::with_capacity(ENCOUNTER_TABS.len() + 1);
    for tab in ENCOUNTER_TABS {
      let outcome = match self.clear_trailing(tab, id_trx).await {
        Ok(cleared) => StepOutcome::Completed { cleared },
        Err(err) => {
          warn!(tab = tab.title(), %id_trx, error = %err, "delete step failed");
          failed(err)
        }
      };
      steps.push(StepReport { tab, outcome });
    }

    let dependents_ok = steps
      .iter()
      .all(|s| matches!(s.outcome, StepOutcome::Completed { .. }));
    let outcome = if dependents_ok {
      self.relation_step(session, id_trx).await
    } else {
      StepOutcome::Skipped { reason: SkipReason::DependentStepFailed }
    };
    if let StepOutcome::Failed { error, .. } = &outcome {
      warn!(%id_trx, error = %error, "relation delete failed");
    }
    steps.push(StepReport { tab: Tab::Relation, outcome });

    let report = DeleteReport { id_trx: id_trx.clone(), steps };
    info!(
      %id_trx,
      cleared = report.cleared(),
      complete = report.is_complete(),
      "deleted encounter"
    );
    Ok(report)
  }

  /// Clear the first ANC row whose leading cell is `id_trx`.
  ///
  /// Only the leading column is consulted. Returns the cleared row.
  pub async fn delete_anc_by_transaction(
    &self,
    session: &Session,
    id_trx: &TransactionId,
  ) -> Result<u32> {
    if !session.owns_transaction(id_trx.as_str()) {
      return Err(Error::AncVisitNotFound(id_trx.clone()));
    }
    let grid = self.store.read(Tab::Anc.full_range()).await.map_err(Error::store)?;
    let row = OwnerIndex::leading(&grid)
      .rows(id_trx.as_str())
      .first()
      .copied()
      .ok_or_else(|| Error::AncVisitNotFound(id_trx.clone()))?;
    self.store.clear(Tab::Anc.row_range(row)).await.map_err(Error::store)?;
    info!(%id_trx, row, "deleted ANC visit");
    Ok(row)
  }
}
